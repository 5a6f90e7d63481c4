use serde::Serialize;

use crate::lexer::{brace_marks, net_depth, BraceMark};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The input document split into lines, with structural braces pre-lexed.
///
/// Each line keeps the terminator it had in the source (`"\n"`, `"\r\n"`,
/// or empty for a final unterminated line). Immutable once built; converters
/// walk it with plain `usize` cursors.
pub struct LineBuffer<'a> {
    lines: Vec<&'a str>,
    endings: Vec<&'a str>,
    marks: Vec<Vec<BraceMark>>,
}

impl<'a> LineBuffer<'a> {
    pub fn new(source: &'a str) -> Self {
        let (lines, endings): (Vec<&'a str>, Vec<&'a str>) = source
            .split_inclusive('\n')
            .map(|raw| {
                let text = raw.strip_suffix('\n').map_or(raw, |t| t.strip_suffix('\r').unwrap_or(t));
                (text, &raw[text.len()..])
            })
            .unzip();
        let marks = brace_marks(&lines);
        Self { lines, endings, marks }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, idx: usize) -> &'a str {
        self.lines[idx]
    }

    /// Terminator of line `idx` as it appeared in the source.
    pub fn ending(&self, idx: usize) -> &'a str {
        self.endings[idx]
    }

    /// How the document ends: the last line's terminator.
    pub fn final_ending(&self) -> &'a str {
        self.endings.last().copied().unwrap_or("")
    }

    pub fn marks(&self, idx: usize) -> &[BraceMark] {
        &self.marks[idx]
    }

    /// Opens minus closes on one line.
    pub fn net_depth(&self, idx: usize) -> i32 {
        net_depth(&self.marks[idx])
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// One constructor parameter, split from the raw list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    /// Inline default expression (`name = expr`), if the list declares one.
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Constructor,
    Method,
    StaticMethod,
}

/// A recognized constructor or method header line.
#[derive(Debug, Clone)]
pub struct Declaration<'a> {
    pub kind: DeclarationKind,
    /// Method name; the class name for constructors.
    pub name: String,
    /// Parameter text between the parentheses, verbatim.
    pub params: &'a str,
    /// Line holding the header and its opening brace.
    pub line: usize,
    /// Byte column of the opening brace.
    pub open_col: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A unit of emitted text: either a slice of the input kept verbatim or a
/// line synthesized by a converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment<'a> {
    Source(&'a str),
    Emitted(String),
}

impl Fragment<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Fragment::Source(s) => s,
            Fragment::Emitted(s) => s,
        }
    }
}

/// Append-only sequence of output lines for one conversion run.
///
/// Every line carries its terminator. Synthesized lines take the terminator
/// of the source line they stand in for.
#[derive(Debug, Default)]
pub struct OutputBuffer<'a> {
    fragments: Vec<(Fragment<'a>, &'a str)>,
}

impl<'a> OutputBuffer<'a> {
    pub fn new() -> Self {
        Self { fragments: Vec::new() }
    }

    /// Copy line `idx` of `buffer` verbatim, terminator included.
    pub fn copy(&mut self, buffer: &LineBuffer<'a>, idx: usize) {
        self.push_source(buffer.line(idx), buffer.ending(idx));
    }

    pub fn push_source(&mut self, text: &'a str, ending: &'a str) {
        self.fragments.push((Fragment::Source(text), ending));
    }

    pub fn push_line(&mut self, line: String, ending: &'a str) {
        self.fragments.push((Fragment::Emitted(line), ending));
    }

    pub fn push_blank(&mut self, ending: &'a str) {
        self.fragments.push((Fragment::Emitted(String::new()), ending));
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Line texts without terminators.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(|(f, _)| f.as_str())
    }

    /// Concatenate every line with its own terminator. The last line ends
    /// with `final_ending` so the document ends the way its source did.
    pub fn render(&self, final_ending: &str) -> String {
        let mut out = String::with_capacity(self.fragments.iter().map(|(f, e)| f.as_str().len() + e.len()).sum());
        let last = self.fragments.len().saturating_sub(1);
        for (i, (fragment, ending)) in self.fragments.iter().enumerate() {
            out.push_str(fragment.as_str());
            out.push_str(if i == last { final_ending } else { ending });
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// What happened to one class.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassReport {
    pub name: String,
    /// 1-based line of the `class` declaration.
    pub line: usize,
    pub methods: Vec<String>,
    /// Parameters whose fallback value was materialized.
    pub defaults: Vec<String>,
    pub synthesized_constructor: bool,
}

/// Summary of one conversion run, printed by `--json`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    pub classes: Vec<ClassReport>,
    pub lines_in: usize,
    pub lines_out: usize,
    pub destructuring_rewrites: usize,
}

impl ConversionReport {
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }
}
