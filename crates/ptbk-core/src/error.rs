//! Error types for the core crate

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Parameter name is malformed or reserved
    #[error("Invalid parameter name '{name}': {message}")]
    InvalidParameterName { name: String, message: String },

    /// Value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    pub(crate) fn parameter_name(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameterName {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
