//! protoshift: rewrite class syntax into constructor functions and
//! prototype-assigned methods, line by line.
//!
//! The scanner works on raw lines with brace-depth tracking rather than a
//! parser. Braces inside strings, template literals and comments are
//! excluded by a small lexer before counting.
//!
//! # Modules
//!
//! - [`lexer`]: Character classification and structural brace marks
//! - [`types`]: Line buffer, declarations, output fragments, reports
//! - [`scanner`]: Matching-brace search and header signature parsing
//! - [`comments`]: Doc comment lookup above a declaration
//! - [`constructor`]: Constructor conversion and default materialization
//! - [`method`]: Method conversion
//! - [`class`]: Per-class state machine
//! - [`rewrite`]: Whole-document driver
//! - [`destructure`]: Optional array-destructuring parameter rewrite
//! - [`config`]: Conversion targets and `.protoshift.toml` loading
//! - [`error`]: Failure taxonomy

pub mod class;
pub mod comments;
pub mod config;
pub mod constructor;
pub mod destructure;
pub mod error;
pub mod lexer;
pub mod method;
pub mod rewrite;
pub mod scanner;
pub mod types;

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

pub use config::{load_config, load_config_file, ClassSpec, ConvertConfig, DefaultParam};
pub use error::{ConvertError, Result};
pub use rewrite::convert_document;
pub use types::{ClassReport, ConversionReport, LineBuffer};

/// Message printed after a successful in-place conversion.
pub const DONE_MESSAGE: &str = "Converted classes to ES5";

/// A converted document and what changed.
#[derive(Debug)]
pub struct Converted {
    pub text: String,
    pub report: ConversionReport,
}

/// Convert a whole document held in memory.
pub fn convert_source(source: &str, config: &ConvertConfig) -> Result<Converted> {
    let buffer = LineBuffer::new(source);
    let (out, mut report) = convert_document(&buffer, config)?;
    let mut text = out.render(buffer.final_ending());

    if config.fix_destructuring {
        let (fixed, rewrites) = destructure::fix_destructuring(&text);
        text = fixed;
        report.destructuring_rewrites = rewrites;
    }

    Ok(Converted { text, report })
}

/// Convert the file at `path` in place.
///
/// The file is rewritten only after the whole document converted; any
/// error leaves it untouched.
pub fn convert_file(path: &Path, config: &ConvertConfig) -> Result<ConversionReport> {
    let start = Instant::now();
    let source = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    debug!(path = %path.display(), bytes = source.len(), "Read document");

    let converted = convert_source(&source, config)?;
    write_atomic(path, &converted.text)?;

    info!(
        path = %path.display(),
        classes = converted.report.classes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Wrote converted document"
    );
    Ok(converted.report)
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.protoshift.tmp"));

    let write = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)
    };

    write().map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        ConvertError::io(path, e)
    })
}
