//! Documentation comment attachment.

use crate::types::LineBuffer;

/// Comment lines found directly above a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// First line the walk accepted (blank lines included).
    pub start: usize,
    /// Indices of the non-blank comment lines, top to bottom.
    pub lines: Vec<usize>,
}

impl CommentBlock {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Lines the backward walk accepts: blank, or starting with a comment opener
/// or a `*` continuation once trimmed.
pub fn is_comment_or_blank(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('*') || t.starts_with("/*") || t.starts_with("//")
}

/// Walk backward from `before - 1`, never below `floor`, collecting the
/// comment run that precedes a declaration.
///
/// Blank lines are stepped over without being collected; the first line that
/// is neither blank nor a comment stops the walk.
pub fn collect_preceding_comment(buffer: &LineBuffer<'_>, before: usize, floor: usize) -> CommentBlock {
    let mut lines = Vec::new();
    let mut start = before;

    while start > floor {
        let line = buffer.line(start - 1);
        if !is_comment_or_blank(line) {
            break;
        }
        if !line.trim().is_empty() {
            lines.push(start - 1);
        }
        start -= 1;
    }

    lines.reverse();
    CommentBlock { start, lines }
}
