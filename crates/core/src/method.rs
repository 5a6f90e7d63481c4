//! Class method → prototype-assigned function expression.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::comments::collect_preceding_comment;
use crate::error::{ConvertError, Result};
use crate::scanner::{parse_signature, scan_body};
use crate::types::{ClassReport, Declaration, DeclarationKind, LineBuffer, OutputBuffer};

static METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(static\s+)?([A-Za-z_$][\w$]*)\s*\(").expect("method pattern"));

static FUNCTION_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfunction\b").expect("function keyword pattern"));

/// Control-flow keywords that share the `name(...) {` shape.
const KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "with", "return", "function"];

/// Recognize a method header: `name(params) {`, optionally `static`.
///
/// A header using the `function` keyword before its opening brace is a call
/// taking a function expression, not a method. Text after the brace is not
/// inspected.
pub fn match_method(line: &str, idx: usize) -> Option<Declaration<'_>> {
    let caps = METHOD_RE.captures(line)?;
    let name = caps.get(2)?;
    if KEYWORDS.contains(&name.as_str()) || name.as_str() == "constructor" {
        return None;
    }
    let paren = caps.get(0)?.end() - 1;
    let sig = parse_signature(line, paren)?;
    if FUNCTION_KEYWORD_RE.is_match(&line[..sig.open_col]) {
        return None;
    }
    Some(Declaration {
        kind: if caps.get(1).is_some() { DeclarationKind::StaticMethod } else { DeclarationKind::Method },
        name: name.as_str().to_string(),
        params: sig.params,
        line: idx,
        open_col: sig.open_col,
    })
}

/// Emit one method: blank separator, its doc comment, the assignment header,
/// the body verbatim and `};`.
///
/// `floor` bounds the backward comment walk to lines not yet emitted.
/// Returns the line after the method's closing brace.
pub fn convert_method<'a>(
    class: &str,
    decl: &Declaration<'a>,
    buffer: &LineBuffer<'a>,
    floor: usize,
    out: &mut OutputBuffer<'a>,
    report: &mut ClassReport,
) -> Result<usize> {
    let span = scan_body(buffer, decl.line, decl.open_col).ok_or_else(|| ConvertError::MalformedBlock {
        class: class.to_string(),
        declaration: decl.name.clone(),
        line: decl.line + 1,
    })?;
    let close = match span.trailing_comment() {
        Some("") => "};".to_string(),
        Some(comment) => format!("}}; {comment}"),
        None => {
            return Err(ConvertError::UnrecognizedDeclarationShape {
                class: class.to_string(),
                expected: format!("nothing but a comment after the body of `{}`", decl.name),
                found: buffer.line(span.close).trim().to_string(),
                line: span.close + 1,
            })
        }
    };
    let comment = collect_preceding_comment(buffer, decl.line, floor);

    let target = match decl.kind {
        DeclarationKind::StaticMethod => format!("{class}.{}", decl.name),
        _ => format!("{class}.prototype.{}", decl.name),
    };
    let head = format!("{target} = function({}) {{", decl.params);
    let header_ending = buffer.ending(decl.line);

    out.push_blank(header_ending);
    for &idx in &comment.lines {
        out.copy(buffer, idx);
    }

    if span.is_inline() {
        out.push_line(format!("{head}{}{close}", span.lead), header_ending);
    } else {
        out.push_line(format!("{head}{}", span.lead), header_ending);
        for idx in span.inner() {
            out.copy(buffer, idx);
        }
        let close_ending = buffer.ending(span.close);
        if !span.tail.trim().is_empty() {
            out.push_source(span.tail, close_ending);
        }
        out.push_line(close, close_ending);
    }

    debug!(class, method = %decl.name, line = decl.line + 1, comment_lines = comment.lines.len(), "Converted method");
    report.methods.push(decl.name.clone());
    Ok(span.close + 1)
}
