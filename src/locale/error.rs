//! Locale loading errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocaleError {
    /// Error when failing to read a file
    #[error("Failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set tree-sitter language: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),

    #[error("Failed to parse source")]
    ParseFailed,

    #[error("Syntax error at line {line}")]
    Syntax { line: u32 },

    /// The literal contains something other than plain data.
    #[error("Unsupported syntax '{kind}' at line {line}")]
    Unsupported { kind: String, line: u32 },

    #[error("Template literal with substitutions at line {line}")]
    TemplateSubstitution { line: u32 },

    /// Objects or arrays nested deeper than the evaluator accepts.
    #[error("Literal nested deeper than {max_depth} levels at line {line}")]
    TooDeep { max_depth: usize, line: u32 },

    #[error("Invalid number literal '{text}' at line {line}")]
    InvalidNumber { text: String, line: u32 },

    /// Other generic error
    #[error("An error occurred: {0}")]
    Other(String),
}
