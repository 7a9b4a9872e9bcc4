//! Parser error types
//!
//! Message wording is matched by tooling, so every variant starts with a
//! stable keyword phrase.

use ptbk_core::{CommandUsagePlace, CoreError};
use thiserror::Error;

/// Parser error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Command line spans several lines
    #[error("Can not contain new line: {0:?}")]
    NewLine(String),

    /// Command line is empty
    #[error("Malformed command: {0:?}")]
    Malformed(String),

    /// No registered command matches the leading tokens
    #[error("Malformed or unknown command: {0:?}")]
    UnknownCommand(String),

    /// Command is not legal in this section of the document
    #[error("Command {command} is not allowed in {place}: {raw:?}")]
    NotAllowedHere {
        command: String,
        place: CommandUsagePlace,
        raw: String,
    },

    /// Arguments rejected by the command's own validation
    #[error("Invalid {command} command: {message}")]
    InvalidArguments { command: String, message: String },

    /// Parameter name is malformed or reserved
    #[error("{0}")]
    InvalidParameterName(#[from] CoreError),

    /// Applying a command would contradict an earlier one
    #[error("Conflicting {command} command: {message}")]
    Conflict { command: String, message: String },

    /// Hook exists in the grammar but has no behavior yet
    #[error("Not implemented: {operation} of {command} command is not available yet")]
    NotImplemented { command: String, operation: String },

    /// Hook was handed a command of another type
    #[error("Command {found} can not be handled by the {parser} parser")]
    WrongCommand { parser: String, found: String },

    /// Document structure violates the markdown conventions
    #[error("Markdown structure error at line {line}: {message}")]
    Markdown { line: usize, message: String },

    /// Built-in grammar is inconsistent
    #[error("Command registry error: {0}")]
    Registry(String),
}

impl ParseError {
    pub(crate) fn invalid(command: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn conflict(command: &str, message: impl Into<String>) -> Self {
        Self::Conflict {
            command: command.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn not_implemented(command: &str, operation: &str) -> Self {
        Self::NotImplemented {
            command: command.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Whether this error marks a feature that is not available yet
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
