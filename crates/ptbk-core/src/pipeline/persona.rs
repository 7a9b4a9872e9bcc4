//! Personas and knowledge sources

use crate::pipeline::ModelRequirements;
use serde::{Deserialize, Serialize};

/// A persona templates can be executed as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaJson {
    pub name: String,

    /// Free text describing the persona, empty when only the name is known
    #[serde(default)]
    pub description: String,

    /// Filled in when the persona is prepared against available models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_requirements: Option<ModelRequirements>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_ids: Option<Vec<u32>>,
}

impl PersonaJson {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            model_requirements: None,
            preparation_ids: None,
        }
    }
}

/// One source of knowledge: a document URL, a file path or inline text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSourceJson {
    /// Name derived from the source content
    pub name: String,

    pub source_content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_ids: Option<Vec<u32>>,
}

impl KnowledgeSourceJson {
    pub fn new(name: impl Into<String>, source_content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_content: source_content.into(),
            preparation_ids: None,
        }
    }
}
