//! Conversion failures.
//!
//! Every variant is fatal for the document being converted. Line numbers are
//! 1-based so they can be pasted straight into an editor.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// A declaration body ran past the end of input before its braces balanced.
    #[error("class {class}: body of `{declaration}` opened on line {line} is never closed")]
    MalformedBlock {
        class: String,
        declaration: String,
        line: usize,
    },

    #[error("class {class}: expected {expected} on line {line}, found `{found}`")]
    UnrecognizedDeclarationShape {
        class: String,
        expected: String,
        found: String,
        line: usize,
    },

    #[error(
        "class {class}: parameter `{param}` has a default but no `this.{field} = {param};` \
         assignment was found in the constructor starting on line {line}"
    )]
    DefaultParameterRelocationMiss {
        class: String,
        param: String,
        field: String,
        line: usize,
    },

    #[error("class {class}: end of class on line {line} does not line up: {detail}")]
    EndOfClassHeuristicMismatch {
        class: String,
        line: usize,
        detail: String,
    },

    #[error("config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// 1-based line the failure points at, when it points at one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedBlock { line, .. }
            | Self::UnrecognizedDeclarationShape { line, .. }
            | Self::DefaultParameterRelocationMiss { line, .. }
            | Self::EndOfClassHeuristicMismatch { line, .. } => Some(*line),
            Self::Config { .. } | Self::Io { .. } => None,
        }
    }
}
