//! Prompt template definitions

use crate::command::{ExecutionType, ExpectFormat, ExpectationUnit};
use crate::naming::title_to_name;
use crate::pipeline::ModelRequirements;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Bounds of one amount expectation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

/// One step of the pipeline, producing exactly one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplateJson {
    /// Kebab-case name derived from the title
    pub name: String,

    /// Heading text of the template section
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub execution_type: ExecutionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_requirements: Option<ModelRequirements>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_source_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joker_parameter_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub postprocessing_function_names: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expectations: BTreeMap<ExpectationUnit, ExpectationRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_format: Option<ExpectFormat>,

    /// Info string of the fenced block, e.g. `javascript` for scripts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,

    /// Template body with `{parameterName}` placeholders
    pub content: String,

    /// Body after preparation (knowledge and samples inlined)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared_content: Option<String>,

    /// Parameters referenced by the body and the jokers
    #[serde(default)]
    pub dependent_parameter_names: BTreeSet<String>,

    /// Parameter this template produces
    pub resulting_parameter_name: String,
}

impl PromptTemplateJson {
    /// Create a template with default settings
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        resulting_parameter_name: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            name: title_to_name(&title),
            title,
            description: None,
            execution_type: ExecutionType::default(),
            model_requirements: None,
            persona_name: None,
            knowledge_source_names: Vec::new(),
            joker_parameter_names: Vec::new(),
            postprocessing_function_names: Vec::new(),
            expectations: BTreeMap::new(),
            expect_format: None,
            content_language: None,
            content: content.into(),
            prepared_content: None,
            dependent_parameter_names: BTreeSet::new(),
            resulting_parameter_name: resulting_parameter_name.into(),
        }
    }

    pub fn with_dependent(mut self, name: impl Into<String>) -> Self {
        self.dependent_parameter_names.insert(name.into());
        self
    }

    pub fn with_execution_type(mut self, execution_type: ExecutionType) -> Self {
        self.execution_type = execution_type;
        self
    }

    pub fn with_persona(mut self, persona_name: impl Into<String>) -> Self {
        self.persona_name = Some(persona_name.into());
        self
    }
}
