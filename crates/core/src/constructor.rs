//! Constructor → named constructor function.
//!
//! Parameter defaults are resolved into a plan before anything is emitted:
//! each defaulted parameter gets exactly one guarded assignment, written in
//! place of the bare `this.field = param;` it replaces.

use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::ClassSpec;
use crate::error::{ConvertError, Result};
use crate::scanner::{parse_signature, scan_body, BodySpan};
use crate::types::{ClassReport, Declaration, DeclarationKind, LineBuffer, OutputBuffer, Param};

static CONSTRUCTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*constructor\s*\(").expect("constructor pattern"));

static BARE_ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"this\.(\w+)\s*=\s*(\w+)\s*(?:;|$)").expect("assignment pattern"));

/// Does this line start a constructor declaration?
pub fn is_constructor_line(line: &str) -> bool {
    CONSTRUCTOR_RE.is_match(line)
}

/// Parse a constructor header. `None` when the line doesn't have the
/// `constructor(...) {` shape.
pub fn parse_constructor<'a>(line: &'a str, idx: usize, class: &str) -> Option<Declaration<'a>> {
    let m = CONSTRUCTOR_RE.find(line)?;
    let sig = parse_signature(line, m.end() - 1)?;
    Some(Declaration {
        kind: DeclarationKind::Constructor,
        name: class.to_string(),
        params: sig.params,
        line: idx,
        open_col: sig.open_col,
    })
}

// ---------------------------------------------------------------------------
// Parameter lists
// ---------------------------------------------------------------------------

/// Byte offsets of `target` outside brackets and quotes.
fn top_level_positions(text: &str, target: u8) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut hits = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth -= 1,
                _ if b == target && depth == 0 => hits.push(i),
                _ => {}
            }
        }
        i += 1;
    }
    hits
}

fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for pos in top_level_positions(text, sep) {
        parts.push(&text[start..pos]);
        start = pos + 1;
    }
    parts.push(&text[start..]);
    parts
}

/// Position of a default-value `=` (not `==`, `=>`, `<=` and friends).
fn default_eq(param: &str) -> Option<usize> {
    let bytes = param.as_bytes();
    top_level_positions(param, b'=').into_iter().find(|&i| {
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + 1).copied();
        !matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) && !matches!(next, Some(b'=' | b'>'))
    })
}

/// Split a raw parameter list into names and inline defaults.
pub fn parse_params(raw: &str) -> Vec<Param> {
    split_top_level(raw, b',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match default_eq(p) {
            Some(eq) => Param { name: p[..eq].trim().to_string(), default: Some(p[eq + 1..].trim().to_string()) },
            None => Param { name: p.to_string(), default: None },
        })
        .collect()
}

/// Canonical spelling used to compare a parameter list with the expected one.
pub fn normalize_params(raw: &str) -> String {
    split_top_level(raw, b',').into_iter().map(str::trim).filter(|p| !p.is_empty()).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Default materialization
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DefaultPlan {
    /// Inner body lines replaced wholesale, keyed by line index.
    rewrites: BTreeMap<usize, String>,
    /// Header text after `{`, possibly rewritten for single-line bodies.
    lead: String,
    /// Parameter reassignments emitted at the top of the body.
    prologue: Vec<String>,
    materialized: Vec<String>,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Whole-word occurrence of `ident` in `text`.
fn mentions(text: &str, ident: &str) -> bool {
    let bytes = text.as_bytes();
    text.match_indices(ident).any(|(pos, _)| {
        let before = pos.checked_sub(1).map(|p| bytes[p]);
        let after = bytes.get(pos + ident.len()).copied();
        !before.is_some_and(|b| is_ident_byte(b) || b == b'.') && !after.is_some_and(is_ident_byte)
    })
}

/// Range of a `this.<field> = <param>;` statement in `text`.
fn find_bare_assignment(text: &str, field: &str, param: &str) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    BARE_ASSIGN_RE
        .captures_iter(text)
        .filter(|caps| &caps[1] == field && &caps[2] == param)
        .filter_map(|caps| caps.get(0))
        .find(|m| !m.start().checked_sub(1).is_some_and(|p| is_ident_byte(bytes[p]) || bytes[p] == b'.'))
        .map(|m| m.range())
}

fn is_guarded(text: &str, field: &str, param: &str) -> bool {
    text.contains(&format!("this.{field}")) && text.contains(&format!("{param} !== undefined"))
}

fn guarded_assignment(field: &str, param: &str, fallback: &str) -> String {
    format!("this.{field} = {param} !== undefined ? {param} : {fallback};")
}

fn plan_defaults(spec: &ClassSpec, params: &[Param], buffer: &LineBuffer<'_>, span: &BodySpan<'_>) -> Result<DefaultPlan> {
    let mut plan = DefaultPlan { lead: span.lead.to_string(), ..DefaultPlan::default() };

    for param in params {
        let configured = spec.default_for(&param.name);
        let Some(fallback) = configured.map(|d| d.fallback.as_str()).or(param.default.as_deref()) else {
            continue;
        };
        let field = configured.map(|d| d.field.as_str()).unwrap_or(param.name.as_str());
        let name = param.name.as_str();

        // Current text of every place an assignment could live. `None` is the header lead.
        let candidates: Vec<(Option<usize>, String)> = if span.is_inline() {
            vec![(None, plan.lead.clone())]
        } else {
            span.inner()
                .map(|idx| {
                    let text = plan.rewrites.get(&idx).cloned().unwrap_or_else(|| buffer.line(idx).to_string());
                    (Some(idx), text)
                })
                .collect()
        };

        let site = candidates
            .iter()
            .find_map(|(key, text)| find_bare_assignment(text, field, name).map(|range| (*key, text, range)));

        let used_elsewhere = configured.is_none()
            && candidates.iter().any(|(key, text)| match &site {
                Some((site_key, _, range)) if site_key == key => {
                    mentions(&text[..range.start], name) || mentions(&text[range.end..], name)
                }
                _ => mentions(text, name),
            });

        match site {
            Some((key, text, range)) if !used_elsewhere => {
                let rewritten =
                    format!("{}{}{}", &text[..range.start], guarded_assignment(field, name, fallback), &text[range.end..]);
                match key {
                    Some(idx) => {
                        plan.rewrites.insert(idx, rewritten);
                    }
                    None => plan.lead = rewritten,
                }
                plan.materialized.push(name.to_string());
            }
            _ if candidates.iter().any(|(_, text)| is_guarded(text, field, name)) => {
                debug!(class = %spec.name, param = name, "Default already guarded in source");
            }
            _ if configured.is_none() => {
                plan.prologue.push(format!("{name} = {name} !== undefined ? {name} : {fallback};"));
                plan.materialized.push(name.to_string());
            }
            _ => {
                return Err(ConvertError::DefaultParameterRelocationMiss {
                    class: spec.name.clone(),
                    param: name.to_string(),
                    field: field.to_string(),
                    line: span.header + 1,
                })
            }
        }
    }

    Ok(plan)
}

/// Indentation of the first non-blank body line, two spaces if there is none.
fn body_indent<'a>(buffer: &LineBuffer<'a>, span: &BodySpan<'a>) -> &'a str {
    span.inner()
        .map(|idx| buffer.line(idx))
        .find(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .unwrap_or("  ")
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Rewrite the constructor on line `cursor` as `function Class(params) { ... }`.
///
/// Returns the line after the constructor's closing brace.
pub fn convert_constructor<'a>(
    spec: &ClassSpec,
    buffer: &LineBuffer<'a>,
    cursor: usize,
    out: &mut OutputBuffer<'a>,
    report: &mut ClassReport,
) -> Result<usize> {
    let line = buffer.line(cursor);
    let expected = || match &spec.constructor_params {
        Some(p) => format!("`constructor({p}) {{`"),
        None => "`constructor(...) {`".to_string(),
    };

    let decl = parse_constructor(line, cursor, &spec.name).ok_or_else(|| ConvertError::UnrecognizedDeclarationShape {
        class: spec.name.clone(),
        expected: expected(),
        found: line.trim().to_string(),
        line: cursor + 1,
    })?;

    if let Some(want) = &spec.constructor_params {
        if normalize_params(want) != normalize_params(decl.params) {
            return Err(ConvertError::UnrecognizedDeclarationShape {
                class: spec.name.clone(),
                expected: expected(),
                found: line.trim().to_string(),
                line: cursor + 1,
            });
        }
    }

    let params = parse_params(decl.params);
    let span = scan_body(buffer, cursor, decl.open_col).ok_or_else(|| ConvertError::MalformedBlock {
        class: spec.name.clone(),
        declaration: "constructor".to_string(),
        line: cursor + 1,
    })?;
    let mut plan = plan_defaults(spec, &params, buffer, &span)?;

    // ES5 has no parameter defaults; strip them once they live in the body.
    let header_params = if params.iter().any(|p| p.default.is_some()) {
        params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
    } else {
        decl.params.to_string()
    };
    let head = format!("function {}({}) {{", spec.name, header_params);
    let close = match span.trailing_comment() {
        Some("") => "}".to_string(),
        Some(comment) => format!("}} {comment}"),
        None => {
            return Err(ConvertError::UnrecognizedDeclarationShape {
                class: spec.name.clone(),
                expected: "nothing but a comment after the constructor body".to_string(),
                found: buffer.line(span.close).trim().to_string(),
                line: span.close + 1,
            })
        }
    };
    let header_ending = buffer.ending(cursor);

    if span.is_inline() {
        let mut body: String = plan.prologue.iter().map(|s| format!(" {s}")).collect();
        if !body.is_empty() && !plan.lead.starts_with(char::is_whitespace) {
            body.push(' ');
        }
        body.push_str(&plan.lead);
        out.push_line(format!("{head}{body}{close}"), header_ending);
    } else {
        out.push_line(format!("{head}{}", plan.lead), header_ending);
        let indent = body_indent(buffer, &span);
        for stmt in &plan.prologue {
            out.push_line(format!("{indent}{stmt}"), header_ending);
        }
        for idx in span.inner() {
            match plan.rewrites.remove(&idx) {
                Some(text) => out.push_line(text, buffer.ending(idx)),
                None => out.copy(buffer, idx),
            }
        }
        let close_ending = buffer.ending(span.close);
        if !span.tail.trim().is_empty() {
            out.push_source(span.tail, close_ending);
        }
        out.push_line(close, close_ending);
    }

    debug!(
        class = %spec.name,
        line = cursor + 1,
        defaults = plan.materialized.len(),
        "Converted constructor"
    );
    report.defaults.extend(plan.materialized);
    Ok(span.close + 1)
}

/// Emit an empty constructor function for a class that declares none.
/// Both lines end with `ending`.
pub fn synthesize_constructor<'a>(class: &str, ending: &'a str, out: &mut OutputBuffer<'a>, report: &mut ClassReport) {
    out.push_line(format!("function {class}() {{"), ending);
    out.push_line("}".to_string(), ending);
    report.synthesized_constructor = true;
}
