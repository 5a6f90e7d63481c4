//! One class entity, from its `class Name {` line to its closing brace.
//!
//! The class's own brace depth is tracked from the opening line; the class
//! ends exactly when it returns to zero.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::comments::is_comment_or_blank;
use crate::config::ClassSpec;
use crate::constructor::{convert_constructor, is_constructor_line, synthesize_constructor};
use crate::error::{ConvertError, Result};
use crate::method::{convert_method, match_method};
use crate::scanner::closing_col;
use crate::types::{ClassReport, LineBuffer, OutputBuffer};

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*class\s+([A-Za-z_$][\w$]*)\s*\{").expect("class pattern"));

/// Name of the class declared on this line, if any.
pub fn class_start(line: &str) -> Option<&str> {
    CLASS_RE.captures(line).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassState {
    SeekingClassStart,
    AwaitingConstructor,
    ConvertingConstructor,
    ConvertingMethods,
    Done,
}

/// Walk state for one class.
struct ClassWalk<'s, 'a> {
    spec: &'s ClassSpec,
    buffer: &'s LineBuffer<'a>,
    /// Brace depth relative to the class's own opening brace.
    depth: i32,
    /// First line of a run of comment/blank lines not yet emitted.
    held: Option<usize>,
    report: ClassReport,
}

impl<'a> ClassWalk<'_, 'a> {
    fn flush_held(&mut self, upto: usize, out: &mut OutputBuffer<'a>) {
        if let Some(start) = self.held.take() {
            for idx in start..upto {
                out.copy(self.buffer, idx);
            }
        }
    }

    fn hold(&mut self, idx: usize) {
        self.held.get_or_insert(idx);
    }

    /// A comment or blank line at class depth that leaves the depth alone.
    fn holdable(&self, idx: usize) -> bool {
        self.depth == 1 && self.buffer.net_depth(idx) == 0 && is_comment_or_blank(self.buffer.line(idx))
    }

    /// Would this line take the class depth to zero?
    fn closes_class(&self, idx: usize) -> bool {
        self.depth + self.buffer.net_depth(idx) <= 0
    }

    /// Validate the class's closing line; it is consumed, never emitted.
    /// Only text from `from_col` on is checked.
    fn finish(&self, idx: usize, from_col: usize) -> Result<()> {
        let line = self.buffer.line(idx);
        let mismatch = |detail: String| ConvertError::EndOfClassHeuristicMismatch {
            class: self.spec.name.clone(),
            line: idx + 1,
            detail,
        };

        let col = closing_col(self.buffer, idx, self.depth)
            .ok_or_else(|| mismatch("no closing brace on the closing line".to_string()))?;
        let before = line[from_col..col].trim();
        let before_ok = before.is_empty() || (before.starts_with("/*") && before.ends_with("*/"));
        let after = line[col + 1..].trim();
        let after = after.strip_prefix(';').unwrap_or(after).trim_start();
        if !before_ok || !(after.is_empty() || after.starts_with("//")) {
            return Err(mismatch(format!("unexpected code around the closing brace: `{}`", line.trim())));
        }

        if let Some(threshold) = self.spec.expected_end_after {
            if idx <= threshold {
                return Err(mismatch(format!(
                    "class closes at line {} but was expected after line {}",
                    idx + 1,
                    threshold + 1
                )));
            }
        }
        Ok(())
    }

    fn no_constructor(&mut self, idx: usize, out: &mut OutputBuffer<'a>) -> Result<()> {
        if let Some(params) = &self.spec.constructor_params {
            return Err(ConvertError::UnrecognizedDeclarationShape {
                class: self.spec.name.clone(),
                expected: format!("`constructor({params}) {{`"),
                found: self.buffer.line(idx).trim().to_string(),
                line: idx + 1,
            });
        }
        debug!(class = %self.spec.name, "No constructor; emitting an empty one");
        let ending = self.buffer.ending(self.report.line - 1);
        synthesize_constructor(&self.spec.name, ending, out, &mut self.report);
        Ok(())
    }
}

/// Convert the class declared at or after `start`.
///
/// Returns the line after the class's closing brace and what was converted.
pub fn convert_class<'a>(
    spec: &ClassSpec,
    buffer: &LineBuffer<'a>,
    start: usize,
    out: &mut OutputBuffer<'a>,
) -> Result<(usize, ClassReport)> {
    let mut walk = ClassWalk { spec, buffer, depth: 0, held: None, report: ClassReport::default() };
    let mut state = ClassState::SeekingClassStart;
    let mut cursor = start;

    let unterminated = |line: usize| ConvertError::MalformedBlock {
        class: spec.name.clone(),
        declaration: format!("class {}", spec.name),
        line: line + 1,
    };

    while state != ClassState::Done {
        match state {
            ClassState::SeekingClassStart => {
                if cursor >= buffer.len() {
                    return Err(unterminated(start));
                }
                let line = buffer.line(cursor);
                if class_start(line) != Some(spec.name.as_str()) {
                    out.copy(buffer, cursor);
                    cursor += 1;
                    continue;
                }
                walk.report.name = spec.name.clone();
                walk.report.line = cursor + 1;
                walk.depth = buffer.net_depth(cursor);
                debug!(class = %spec.name, line = cursor + 1, "Converting class");

                if walk.depth <= 0 {
                    // `class Name {}` on one line.
                    let body_col = CLASS_RE.find(line).map_or(0, |m| m.end());
                    walk.finish(cursor, body_col)?;
                    walk.no_constructor(cursor, out)?;
                    cursor += 1;
                    state = ClassState::Done;
                    continue;
                }
                if walk.depth > 1 {
                    return Err(ConvertError::UnrecognizedDeclarationShape {
                        class: spec.name.clone(),
                        expected: "class body starting on the line after `class Name {`".to_string(),
                        found: line.trim().to_string(),
                        line: cursor + 1,
                    });
                }
                cursor += 1;
                state = ClassState::AwaitingConstructor;
            }

            ClassState::AwaitingConstructor => {
                if cursor >= buffer.len() {
                    return Err(unterminated(walk.report.line - 1));
                }
                let line = buffer.line(cursor);
                if walk.depth == 1 && is_constructor_line(line) {
                    walk.flush_held(cursor, out);
                    state = ClassState::ConvertingConstructor;
                } else if walk.depth == 1 && (match_method(line, cursor).is_some() || walk.closes_class(cursor)) {
                    // Leave held comments for the first method.
                    walk.no_constructor(cursor, out)?;
                    state = ClassState::ConvertingMethods;
                } else if walk.holdable(cursor) {
                    walk.hold(cursor);
                    cursor += 1;
                } else {
                    walk.flush_held(cursor, out);
                    walk.depth += buffer.net_depth(cursor);
                    out.copy(buffer, cursor);
                    cursor += 1;
                }
            }

            ClassState::ConvertingConstructor => {
                cursor = convert_constructor(spec, buffer, cursor, out, &mut walk.report)?;
                state = ClassState::ConvertingMethods;
            }

            ClassState::ConvertingMethods => {
                if cursor >= buffer.len() {
                    return Err(unterminated(walk.report.line - 1));
                }
                let line = buffer.line(cursor);
                if walk.holdable(cursor) {
                    walk.hold(cursor);
                    cursor += 1;
                    continue;
                }
                if walk.depth == 1 && is_constructor_line(line) {
                    let expected = if walk.report.synthesized_constructor {
                        "the constructor before the first method"
                    } else {
                        "a single constructor"
                    };
                    return Err(ConvertError::UnrecognizedDeclarationShape {
                        class: spec.name.clone(),
                        expected: expected.to_string(),
                        found: line.trim().to_string(),
                        line: cursor + 1,
                    });
                }
                if walk.depth == 1 {
                    if let Some(decl) = match_method(line, cursor) {
                        let floor = walk.held.take().unwrap_or(cursor);
                        cursor = convert_method(&spec.name, &decl, buffer, floor, out, &mut walk.report)?;
                        continue;
                    }
                }

                walk.flush_held(cursor, out);
                if walk.closes_class(cursor) {
                    walk.finish(cursor, 0)?;
                    cursor += 1;
                    state = ClassState::Done;
                } else {
                    walk.depth += buffer.net_depth(cursor);
                    out.copy(buffer, cursor);
                    cursor += 1;
                }
            }

            ClassState::Done => {}
        }
    }

    debug!(
        class = %spec.name,
        methods = walk.report.methods.len(),
        end = cursor,
        "Finished class"
    );
    Ok((cursor, walk.report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultParam;

    fn convert(spec: &ClassSpec, src: &str) -> Result<(Vec<String>, ClassReport, usize)> {
        let buffer = LineBuffer::new(src);
        let mut out = OutputBuffer::new();
        let (next, report) = convert_class(spec, &buffer, 0, &mut out)?;
        Ok((out.lines().map(str::to_string).collect(), report, next))
    }

    const LOCK: &str = "\
class DistributedLock {
  /**
   * Creates a lock.
   */
  constructor(resource, timeout) {
    this.resource = resource;
    this.timeout = timeout;
  }

  /**
   * Try to take the lock.
   */
  acquire() {
    if (this.held) {
      return false;
    }
    this.held = true;
    return true;
  }

  release() {
    this.held = false;
  }
}
after();";

    fn lock_spec() -> ClassSpec {
        ClassSpec {
            name: "DistributedLock".to_string(),
            constructor_params: Some("resource, timeout".to_string()),
            defaults: vec![DefaultParam::new("timeout", "30000")],
            expected_end_after: None,
        }
    }

    #[test]
    fn test_class_state_machine() {
        let (lines, report, next) = convert(&lock_spec(), LOCK).unwrap();
        assert_eq!(
            lines,
            vec![
                "  /**",
                "   * Creates a lock.",
                "   */",
                "function DistributedLock(resource, timeout) {",
                "    this.resource = resource;",
                "    this.timeout = timeout !== undefined ? timeout : 30000;",
                "}",
                "",
                "  /**",
                "   * Try to take the lock.",
                "   */",
                "DistributedLock.prototype.acquire = function() {",
                "    if (this.held) {",
                "      return false;",
                "    }",
                "    this.held = true;",
                "    return true;",
                "};",
                "",
                "DistributedLock.prototype.release = function() {",
                "    this.held = false;",
                "};",
            ]
        );
        assert_eq!(report.methods, vec!["acquire", "release"]);
        assert_eq!(report.line, 1);
        assert_eq!(next, 24, "cursor should sit on the line after the class");
    }

    #[test]
    fn test_comment_emitted_once() {
        let (lines, _, _) = convert(&lock_spec(), LOCK).unwrap();
        let count = lines.iter().filter(|l| l.contains("Try to take the lock.")).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_class_without_constructor() {
        let src = "class Empty {\n  // Says hi\n  hi() {\n    return 1;\n  }\n}";
        let (lines, report, _) = convert(&ClassSpec::unconstrained("Empty"), src).unwrap();
        assert_eq!(
            lines,
            vec![
                "function Empty() {",
                "}",
                "",
                "  // Says hi",
                "Empty.prototype.hi = function() {",
                "    return 1;",
                "};",
            ]
        );
        assert!(report.synthesized_constructor);
    }

    #[test]
    fn test_missing_required_constructor() {
        let src = "class DistributedLock {\n  acquire() {\n  }\n}";
        let err = convert(&lock_spec(), src).unwrap_err();
        assert!(matches!(err, ConvertError::UnrecognizedDeclarationShape { line: 2, .. }), "got {err}");
    }

    #[test]
    fn test_one_line_empty_class() {
        let (lines, _, next) = convert(&ClassSpec::unconstrained("Marker"), "class Marker {}").unwrap();
        assert_eq!(lines, vec!["function Marker() {", "}"]);
        assert_eq!(next, 1);
    }

    #[test]
    fn test_unterminated_class() {
        let src = "class A {\n  constructor() {\n  }\n  run() {\n  }\n";
        let err = convert(&ClassSpec::unconstrained("A"), src).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedBlock { line: 1, .. }), "got {err}");
    }

    #[test]
    fn test_closing_line_with_code_is_mismatch() {
        let src = "class A {\n  constructor() {\n  }\n} init();";
        let err = convert(&ClassSpec::unconstrained("A"), src).unwrap_err();
        assert!(matches!(err, ConvertError::EndOfClassHeuristicMismatch { line: 4, .. }), "got {err}");
    }

    #[test]
    fn test_expected_end_threshold() {
        let spec = ClassSpec { expected_end_after: Some(10), ..ClassSpec::unconstrained("A") };
        let err = convert(&spec, "class A {\n  constructor() {\n  }\n};").unwrap_err();
        assert!(matches!(err, ConvertError::EndOfClassHeuristicMismatch { .. }));

        let spec = ClassSpec { expected_end_after: Some(2), ..ClassSpec::unconstrained("A") };
        assert!(convert(&spec, "class A {\n  constructor() {\n  }\n};").is_ok());
    }

    #[test]
    fn test_non_method_members_pass_through() {
        let src = "class A {\n  constructor() {\n  }\n  static VERSION = { major: 1 };\n  get() {\n  }\n}";
        let (lines, _, _) = convert(&ClassSpec::unconstrained("A"), src).unwrap();
        assert!(lines.contains(&"  static VERSION = { major: 1 };".to_string()));
        assert!(lines.contains(&"A.prototype.get = function() {".to_string()));
    }

    #[test]
    fn test_constructor_after_method_is_error() {
        let src = "class A {\n  run() {\n    go();\n  }\n  constructor(x) {\n    this.x = x;\n  }\n}";
        let err = convert(&ClassSpec::unconstrained("A"), src).unwrap_err();
        assert!(matches!(err, ConvertError::UnrecognizedDeclarationShape { line: 5, .. }), "got {err}");
    }

    #[test]
    fn test_second_constructor_is_error() {
        let src = "class A {\n  constructor() {\n  }\n  constructor(x) {\n  }\n}";
        let err = convert(&ClassSpec::unconstrained("A"), src).unwrap_err();
        assert!(matches!(err, ConvertError::UnrecognizedDeclarationShape { line: 4, .. }), "got {err}");
    }

    #[test]
    fn test_commented_closing_line_counts() {
        let src = "class A {\n  constructor() {\n  }\n/* end A */ }\nafter();";
        let (lines, _, next) = convert(&ClassSpec::unconstrained("A"), src).unwrap();
        assert_eq!(lines, vec!["function A() {", "}"]);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_method_named_like_keyword_converted() {
        let src = "class A {\n  functionCount() {\n    return 1;\n  }\n  wrap(fn) { // returns a function\n    return fn;\n  }\n}";
        let (lines, report, _) = convert(&ClassSpec::unconstrained("A"), src).unwrap();
        assert_eq!(report.methods, vec!["functionCount", "wrap"]);
        assert!(lines.contains(&"A.prototype.functionCount = function() {".to_string()));
        assert!(lines.contains(&"A.prototype.wrap = function(fn) { // returns a function".to_string()));
        assert!(!lines.iter().any(|l| l.trim_start().starts_with("functionCount(")));
    }

    #[test]
    fn test_class_start() {
        assert_eq!(class_start("class Transaction {"), Some("Transaction"));
        assert_eq!(class_start("  class  Foo{"), Some("Foo"));
        assert_eq!(class_start("class Foo extends Bar {"), None);
        assert_eq!(class_start("// class Foo {"), None);
    }
}
