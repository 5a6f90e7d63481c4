//! Brace-depth scanning over a [`LineBuffer`].

use crate::lexer::BraceKind;
use crate::types::LineBuffer;

/// Where a declaration body starts and ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySpan<'a> {
    /// Line holding the opening brace.
    pub header: usize,
    /// Line holding the matching closing brace.
    pub close: usize,
    /// Text after the opening brace on the header line (up to the closing
    /// brace when both sit on the same line).
    pub lead: &'a str,
    /// Text before the closing brace on the closing line. Empty for
    /// single-line bodies.
    pub tail: &'a str,
    /// Text after the closing brace on the closing line.
    pub trailer: &'a str,
}

impl<'a> BodySpan<'a> {
    /// Comment following the closing brace, with an optional `;` before it
    /// dropped. `Some("")` when nothing follows; `None` when code does.
    pub fn trailing_comment(&self) -> Option<&'a str> {
        let rest = self.trailer.trim();
        let rest = rest.strip_prefix(';').map_or(rest, str::trim_start);
        if rest.is_empty() || rest.starts_with("//") || (rest.starts_with("/*") && rest.ends_with("*/")) {
            Some(rest)
        } else {
            None
        }
    }

    pub fn is_inline(&self) -> bool {
        self.header == self.close
    }

    /// Lines strictly between the opening and closing lines.
    pub fn inner(&self) -> std::ops::Range<usize> {
        if self.is_inline() {
            self.header..self.header
        } else {
            self.header + 1..self.close
        }
    }
}

/// Find the brace matching the one at `open_col` on line `header`.
///
/// Depth starts at 1 just after the opening brace and every structural brace
/// on following lines moves it, opens and closes on the same line included.
/// The first brace that brings it to 0 closes the body. Returns `None` when
/// the input ends first.
pub fn scan_body<'a>(buffer: &LineBuffer<'a>, header: usize, open_col: usize) -> Option<BodySpan<'a>> {
    let mut depth: i32 = 1;
    let header_line = buffer.line(header);

    for mark in buffer.marks(header).iter().filter(|m| m.col > open_col) {
        depth += mark.delta();
        if depth == 0 {
            return Some(BodySpan {
                header,
                close: header,
                lead: &header_line[open_col + 1..mark.col],
                tail: "",
                trailer: &header_line[mark.col + 1..],
            });
        }
    }

    for idx in header + 1..buffer.len() {
        for mark in buffer.marks(idx) {
            depth += mark.delta();
            if depth == 0 {
                debug_assert_eq!(mark.kind, BraceKind::Close);
                let close_line = buffer.line(idx);
                return Some(BodySpan {
                    header,
                    close: idx,
                    lead: &header_line[open_col + 1..],
                    tail: &close_line[..mark.col],
                    trailer: &close_line[mark.col + 1..],
                });
            }
        }
    }

    None
}

/// Column of the brace that takes a running depth of `depth` to zero on
/// `idx`, if the line gets there.
pub fn closing_col(buffer: &LineBuffer<'_>, idx: usize, mut depth: i32) -> Option<usize> {
    for mark in buffer.marks(idx) {
        depth += mark.delta();
        if depth <= 0 {
            return Some(mark.col);
        }
    }
    None
}

/// A `( params ) {` run found on a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature<'a> {
    pub params: &'a str,
    pub open_col: usize,
}

/// Parse the parameter list starting at the `(` at byte `paren` and the
/// opening brace that must follow it.
pub fn parse_signature(line: &str, paren: usize) -> Option<Signature<'_>> {
    let bytes = line.as_bytes();
    if bytes.get(paren) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut close = None;
    let mut i = paren;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    let close = close?;
    let after = &line[close + 1..];
    let skipped = after.len() - after.trim_start().len();
    let open_col = close + 1 + skipped;
    if bytes.get(open_col) != Some(&b'{') {
        return None;
    }

    Some(Signature { params: &line[paren + 1..close], open_col })
}
