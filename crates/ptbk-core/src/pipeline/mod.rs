//! Compiled pipeline definitions
//!
//! `PipelineJson` is the interchange artifact produced by the compiler and
//! consumed by executors, validators and the stringifier. It is a plain
//! value: consumers receive it by reference, and transformations build a
//! new value instead of editing one in place.

mod model;
mod parameter;
mod persona;
mod template;

pub use model::ModelRequirements;
pub use parameter::ParameterJson;
pub use persona::{KnowledgeSourceJson, PersonaJson};
pub use template::{ExpectationRange, PromptTemplateJson};

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// A compiled pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJson {
    /// Unique URL identifying the pipeline within a collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_url: Option<String>,

    pub title: String,

    /// Version of the pipeline language the source was written for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promptbook_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered parameters, names unique
    #[serde(default)]
    pub parameters: Vec<ParameterJson>,

    /// Templates in declaration order
    #[serde(default)]
    pub prompt_templates: Vec<PromptTemplateJson>,

    #[serde(default)]
    pub knowledge_sources: Vec<KnowledgeSourceJson>,

    #[serde(default)]
    pub personas: Vec<PersonaJson>,

    /// Model requirements set in the pipeline head
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model_requirements: Option<ModelRequirements>,
}

impl PipelineJson {
    /// Create an empty pipeline
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            pipeline_url: None,
            title: title.into(),
            promptbook_version: None,
            description: None,
            parameters: Vec::new(),
            prompt_templates: Vec::new(),
            knowledge_sources: Vec::new(),
            personas: Vec::new(),
            default_model_requirements: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.pipeline_url = Some(url.into());
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterJson) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_template(mut self, template: PromptTemplateJson) -> Self {
        self.prompt_templates.push(template);
        self
    }

    pub fn with_persona(mut self, persona: PersonaJson) -> Self {
        self.personas.push(persona);
        self
    }

    /// Find a parameter by canonical name
    pub fn parameter(&self, name: &str) -> Option<&ParameterJson> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Find the first template producing a parameter
    pub fn producer_of(&self, parameter_name: &str) -> Option<&PromptTemplateJson> {
        self.prompt_templates
            .iter()
            .find(|t| t.resulting_parameter_name == parameter_name)
    }

    pub fn persona(&self, name: &str) -> Option<&PersonaJson> {
        self.personas.iter().find(|p| p.name == name)
    }

    pub fn knowledge_source(&self, name: &str) -> Option<&KnowledgeSourceJson> {
        self.knowledge_sources.iter().find(|k| k.name == name)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}
