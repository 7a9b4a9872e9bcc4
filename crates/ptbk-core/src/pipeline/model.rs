//! Model requirements

use crate::command::ModelVariant;
use serde::{Deserialize, Serialize};

/// What kind of model a template (or persona) needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_variant: Option<ModelVariant>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl ModelRequirements {
    pub fn is_empty(&self) -> bool {
        self.model_variant.is_none() && self.model_name.is_none()
    }
}
