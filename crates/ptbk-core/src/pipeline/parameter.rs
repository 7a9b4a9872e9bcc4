//! Pipeline parameter definitions

use serde::{Deserialize, Serialize};

/// A named slot flowing between templates, in from the caller or out to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterJson {
    /// Canonical camelCase name, unique within the pipeline
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Provided by the caller
    #[serde(default)]
    pub is_input: bool,

    /// Returned to the caller
    #[serde(default)]
    pub is_output: bool,
}

impl ParameterJson {
    /// Create an intermediate parameter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_input: false,
            is_output: false,
        }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self {
            is_input: true,
            ..Self::new(name)
        }
    }

    pub fn output(name: impl Into<String>) -> Self {
        Self {
            is_output: true,
            ..Self::new(name)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
