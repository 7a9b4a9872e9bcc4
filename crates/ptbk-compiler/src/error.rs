//! Compiler error types

use crate::validator::ValidationError;
use ptbk_core::CoreError;
use ptbk_parser::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Compiler error
#[derive(Error, Debug)]
pub enum CompileError {
    /// A command line was rejected, with where it was found
    #[error("{section} (line {line}): {source}")]
    Command {
        section: String,
        line: usize,
        source: ParseError,
    },

    /// Document structure error not tied to a single command
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A template section is incomplete
    #[error("Template {template:?} (line {line}): {message}")]
    Template {
        template: String,
        line: usize,
        message: String,
    },

    /// Code block in the pipeline head while head code blocks are disallowed
    #[error("Code block at line {line} is outside of any template")]
    HeadCodeBlock { line: usize },

    /// The compiled pipeline breaks one or more invariants
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Serialization of the compiled pipeline
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid compiler options
    #[error("Invalid compiler options: {0}")]
    Options(String),

    /// Pipeline collection inconsistency
    #[error("Collection error: {0}")]
    Collection(String),

    /// Reading pipeline sources from disk
    #[error("Failed to read {path:?}: {message}")]
    Io { path: PathBuf, message: String },
}

impl CompileError {
    pub(crate) fn command(section: &str, line: usize, source: ParseError) -> Self {
        Self::Command {
            section: section.to_string(),
            line,
            source,
        }
    }

    /// The underlying parse error, if compilation stopped on one
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Command { source, .. } | Self::Parse(source) => Some(source),
            _ => None,
        }
    }

    /// Whether compilation hit a feature that is not available yet
    pub fn is_not_implemented(&self) -> bool {
        self.parse_error().is_some_and(ParseError::is_not_implemented)
    }
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;
