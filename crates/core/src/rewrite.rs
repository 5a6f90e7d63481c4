//! Whole-document pass.

use tracing::{debug, info};

use crate::class::{class_start, convert_class};
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::types::{ConversionReport, LineBuffer, OutputBuffer};

/// Rewrite every configured class in `buffer`; every other line is copied
/// unchanged. Classes nested inside converted bodies are not revisited.
pub fn convert_document<'a>(buffer: &LineBuffer<'a>, config: &ConvertConfig) -> Result<(OutputBuffer<'a>, ConversionReport)> {
    let mut out = OutputBuffer::new();
    let mut report = ConversionReport { lines_in: buffer.len(), ..ConversionReport::default() };
    let mut cursor = 0;

    while cursor < buffer.len() {
        let line = buffer.line(cursor);
        let spec = class_start(line).and_then(|name| config.spec_for(name));
        match spec {
            Some(spec) => {
                let (next, class_report) = convert_class(&spec, buffer, cursor, &mut out)?;
                report.classes.push(class_report);
                cursor = next;
            }
            None => {
                if let Some(name) = class_start(line) {
                    debug!(class = name, line = cursor + 1, "Class not configured; copying as is");
                }
                out.copy(buffer, cursor);
                cursor += 1;
            }
        }
    }

    report.lines_out = out.len();
    info!(
        classes = report.classes.len(),
        methods = report.method_count(),
        lines_in = report.lines_in,
        lines_out = report.lines_out,
        "Converted document"
    );
    Ok((out, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassSpec;
    use crate::error::ConvertError;

    fn widget_config() -> ConvertConfig {
        ConvertConfig { classes: vec![ClassSpec::unconstrained("Widget")], ..ConvertConfig::default() }
    }

    fn render(src: &str, config: &ConvertConfig) -> Result<String> {
        let buffer = LineBuffer::new(src);
        let (out, _) = convert_document(&buffer, config)?;
        Ok(out.render(buffer.final_ending()))
    }

    #[test]
    fn test_passthrough_outside_classes() {
        let src = "var a = { b: 1 };\n\nfunction f() {\n  return '}';\n}\n";
        assert_eq!(render(src, &ConvertConfig::default()).unwrap(), src);
    }

    #[test]
    fn test_widget_scenario() {
        let src = "\
class Widget {
  constructor(id, retries) {
    this.id = id;
    this.retries = retries !== undefined ? retries : 5;
  }
  ping() {
    return this.id;
  }
}
";
        let expected = "\
function Widget(id, retries) {
    this.id = id;
    this.retries = retries !== undefined ? retries : 5;
}

Widget.prototype.ping = function() {
    return this.id;
};
";
        assert_eq!(render(src, &widget_config()).unwrap(), expected);
    }

    #[test]
    fn test_unconfigured_class_untouched() {
        let src = "class Other {\n  constructor() {\n  }\n}";
        assert_eq!(render(src, &widget_config()).unwrap(), src);
    }

    #[test]
    fn test_surrounding_lines_identical() {
        let src = "// header\nconst X = 1;\nclass Widget {\n  constructor() {\n  }\n}\n// footer {\nX();";
        let out = render(src, &widget_config()).unwrap();
        assert!(out.starts_with("// header\nconst X = 1;\nfunction Widget() {\n}\n"));
        assert!(out.ends_with("// footer {\nX();"));
    }

    #[test]
    fn test_malformed_method_fails() {
        let src = "class Widget {\n  constructor() {\n  }\n  ping() {\n    return 1;\n}\n";
        let err = render(src, &widget_config()).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedBlock { .. }), "got {err}");
    }

    #[test]
    fn test_two_classes_reported() {
        let src = "class Widget {\n  constructor() {\n  }\n  a() {\n  }\n}\nclass Gadget {\n  constructor() {\n  }\n}\n";
        let config = ConvertConfig { convert_all: true, ..widget_config() };
        let buffer = LineBuffer::new(src);
        let (_, report) = convert_document(&buffer, &config).unwrap();
        let names: Vec<_> = report.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Widget", "Gadget"]);
        assert_eq!(report.method_count(), 1);
        assert_eq!(report.classes[1].line, 7);
    }

    #[test]
    fn test_mixed_endings_pass_through() {
        let src = "var a = 1;\nvar b = 2;\r\nvar c = 3;\n";
        assert_eq!(render(src, &ConvertConfig::default()).unwrap(), src);
    }

    #[test]
    fn test_mixed_endings_around_class() {
        let src = "a();\r\nclass Widget {\n  constructor() {\r\n  }\n  ping() {\r\n    return 1;\n  }\r\n}\nb();\r\n";
        let out = render(src, &widget_config()).unwrap();
        assert_eq!(
            out,
            "a();\r\nfunction Widget() {\r\n}\n\r\nWidget.prototype.ping = function() {\r\n    return 1;\n};\r\nb();\r\n"
        );
    }

    #[test]
    fn test_crlf_preserved() {
        let src = "x();\r\nclass Widget {\r\n  constructor() {\r\n  }\r\n}\r\n";
        let out = render(src, &widget_config()).unwrap();
        assert_eq!(out, "x();\r\nfunction Widget() {\r\n}\r\n");
    }
}
