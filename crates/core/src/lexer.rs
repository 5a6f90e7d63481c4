//! Minimal character classifier for brace counting.
//!
//! Tracks whether each byte is code, string/template text or comment text so
//! that only structural braces are reported. State carries across lines:
//! block comments and template literals may span many of them. Regular
//! expression literals are not recognized.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceKind {
    Open,
    Close,
}

/// A structural brace at byte column `col` of its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceMark {
    pub col: usize,
    pub kind: BraceKind,
}

impl BraceMark {
    pub fn delta(&self) -> i32 {
        match self.kind {
            BraceKind::Open => 1,
            BraceKind::Close => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    BlockComment,
    Quoted(u8),
    Template,
}

#[derive(Debug)]
pub struct Lexer {
    state: State,
    /// Open `${` interpolations, each with the brace depth inside it.
    interpolations: Vec<u32>,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self { state: State::Code, interpolations: Vec::new() }
    }

    /// Classify one line and return its structural braces, left to right.
    pub fn scan_line(&mut self, line: &str) -> Vec<BraceMark> {
        let bytes = line.as_bytes();
        let mut marks = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();
            match self.state {
                State::BlockComment => {
                    if b == b'*' && next == Some(b'/') {
                        self.state = State::Code;
                        i += 2;
                        continue;
                    }
                }
                State::Quoted(quote) => {
                    if b == b'\\' {
                        i += 2;
                        continue;
                    }
                    if b == quote {
                        self.state = State::Code;
                    }
                }
                State::Template => {
                    if b == b'\\' {
                        i += 2;
                        continue;
                    }
                    if b == b'`' {
                        self.state = State::Code;
                    } else if b == b'$' && next == Some(b'{') {
                        self.interpolations.push(0);
                        self.state = State::Code;
                        i += 2;
                        continue;
                    }
                }
                State::Code => match b {
                    b'/' if next == Some(b'/') => break,
                    b'/' if next == Some(b'*') => {
                        self.state = State::BlockComment;
                        i += 2;
                        continue;
                    }
                    b'\'' | b'"' => self.state = State::Quoted(b),
                    b'`' => self.state = State::Template,
                    b'{' => {
                        if let Some(depth) = self.interpolations.last_mut() {
                            *depth += 1;
                        }
                        marks.push(BraceMark { col: i, kind: BraceKind::Open });
                    }
                    b'}' => match self.interpolations.last().copied() {
                        Some(0) => {
                            self.interpolations.pop();
                            self.state = State::Template;
                        }
                        Some(_) => {
                            if let Some(depth) = self.interpolations.last_mut() {
                                *depth -= 1;
                            }
                            marks.push(BraceMark { col: i, kind: BraceKind::Close });
                        }
                        None => marks.push(BraceMark { col: i, kind: BraceKind::Close }),
                    },
                    _ => {}
                },
            }
            i += 1;
        }

        // Quotes cannot span lines; an unterminated one ends here.
        if let State::Quoted(_) = self.state {
            self.state = State::Code;
        }

        marks
    }
}

/// Lex a whole document, one mark list per line.
pub fn brace_marks(lines: &[&str]) -> Vec<Vec<BraceMark>> {
    let mut lexer = Lexer::new();
    lines.iter().map(|line| lexer.scan_line(line)).collect()
}

/// Net brace depth change over a set of marks.
pub fn net_depth(marks: &[BraceMark]) -> i32 {
    marks.iter().map(BraceMark::delta).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(marks: &[BraceMark]) -> Vec<(usize, BraceKind)> {
        marks.iter().map(|m| (m.col, m.kind)).collect()
    }

    #[test]
    fn test_plain_code_braces() {
        let mut lexer = Lexer::new();
        let marks = lexer.scan_line("if (a) { b(); } else {");
        assert_eq!(
            cols(&marks),
            vec![(7, BraceKind::Open), (14, BraceKind::Close), (21, BraceKind::Open)]
        );
        assert_eq!(net_depth(&marks), 1);
    }

    #[test]
    fn test_braces_in_strings_ignored() {
        let mut lexer = Lexer::new();
        let marks = lexer.scan_line(r#"var s = "{" + '}' + "\"{";"#);
        assert!(marks.is_empty(), "string braces counted: {marks:?}");
    }

    #[test]
    fn test_line_comment_stops_counting() {
        let mut lexer = Lexer::new();
        let marks = lexer.scan_line("run(); // closes } here {");
        assert!(marks.is_empty());
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let marks = brace_marks(&["/* start {", " * still }", " */ {"]);
        assert!(marks[0].is_empty());
        assert!(marks[1].is_empty());
        assert_eq!(cols(&marks[2]), vec![(4, BraceKind::Open)]);
    }

    #[test]
    fn test_template_interpolation_is_code() {
        let mut lexer = Lexer::new();
        let marks = lexer.scan_line("var t = `a { ${ fn({x: 1}) } }`; {");
        // Only the object literal inside the interpolation and the final brace count.
        assert_eq!(net_depth(&marks), 1);
        assert_eq!(marks.len(), 3, "unexpected marks: {marks:?}");
    }

    #[test]
    fn test_template_spans_lines() {
        let marks = brace_marks(&["var html = `", "  <div>{{name}}</div>", "`;", "{"]);
        assert!(marks[1].is_empty());
        assert_eq!(net_depth(&marks[3]), 1);
    }

    #[test]
    fn test_unterminated_quote_resets_at_line_end() {
        let marks = brace_marks(&["var bad = 'oops", "{"]);
        assert_eq!(net_depth(&marks[1]), 1);
    }
}
