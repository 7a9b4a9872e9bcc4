//! Command definitions
//!
//! A command is one markdown list item of a pipeline document, parsed into a
//! typed value. Commands are plain data: they are produced by the parser,
//! consumed once by the compiler and never mutated in between.

mod kinds;

pub use kinds::{
    canonical_keyword, CommandUsagePlace, ExecutionType, ExpectFormat, ExpectationSign, ExpectationUnit, ForeachCell,
    ForeachFormat, ModelRequirementKey, ModelVariant,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// `PROMPTBOOK URL https://...`
    #[serde(rename_all = "camelCase")]
    PromptbookUrl { pipeline_url: String },

    /// `PROMPTBOOK VERSION 1.0.0`
    #[serde(rename_all = "camelCase")]
    PromptbookVersion { promptbook_version: String },

    /// `INPUT PARAMETER {name} description`
    #[serde(rename_all = "camelCase")]
    Parameter {
        parameter_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameter_description: Option<String>,
        is_input: bool,
        is_output: bool,
    },

    /// `EXECUTE PROMPT TEMPLATE`
    #[serde(rename_all = "camelCase")]
    Execute { execution_type: ExecutionType },

    /// `MODEL VARIANT Chat` / `MODEL NAME gpt-4`
    #[serde(rename_all = "camelCase")]
    Model {
        key: ModelRequirementKey,
        value: String,
    },

    /// `PERSONA Jane, a lawyer`
    #[serde(rename_all = "camelCase")]
    Persona {
        persona_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        persona_description: Option<String>,
    },

    /// `KNOWLEDGE https://example.com/doc.pdf`
    #[serde(rename_all = "camelCase")]
    Knowledge { source_content: String },

    /// `EXPECT MIN 2 LINES`
    #[serde(rename_all = "camelCase")]
    ExpectAmount {
        sign: ExpectationSign,
        unit: ExpectationUnit,
        amount: u32,
    },

    /// `EXPECT JSON`
    #[serde(rename_all = "camelCase")]
    ExpectFormat { format: ExpectFormat },

    /// `POSTPROCESS unwrapResult`
    #[serde(rename_all = "camelCase")]
    Postprocess { function_name: String },

    /// `JOKER {name}`
    #[serde(rename_all = "camelCase")]
    Joker { parameter_name: String },

    /// `FOREACH List Line -> {customer}`
    #[serde(rename_all = "camelCase")]
    Foreach {
        format_name: ForeachFormat,
        cell_name: ForeachCell,
        parameter_name: String,
    },
}

/// Discriminant of [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    PromptbookUrl,
    PromptbookVersion,
    Parameter,
    Execute,
    Model,
    Persona,
    Knowledge,
    ExpectAmount,
    ExpectFormat,
    Postprocess,
    Joker,
    Foreach,
}

impl CommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PromptbookUrl => "PROMPTBOOK_URL",
            Self::PromptbookVersion => "PROMPTBOOK_VERSION",
            Self::Parameter => "PARAMETER",
            Self::Execute => "EXECUTE",
            Self::Model => "MODEL",
            Self::Persona => "PERSONA",
            Self::Knowledge => "KNOWLEDGE",
            Self::ExpectAmount => "EXPECT_AMOUNT",
            Self::ExpectFormat => "EXPECT_FORMAT",
            Self::Postprocess => "POSTPROCESS",
            Self::Joker => "JOKER",
            Self::Foreach => "FOREACH",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    /// Get the discriminant of this command
    pub fn command_type(&self) -> CommandType {
        match self {
            Self::PromptbookUrl { .. } => CommandType::PromptbookUrl,
            Self::PromptbookVersion { .. } => CommandType::PromptbookVersion,
            Self::Parameter { .. } => CommandType::Parameter,
            Self::Execute { .. } => CommandType::Execute,
            Self::Model { .. } => CommandType::Model,
            Self::Persona { .. } => CommandType::Persona,
            Self::Knowledge { .. } => CommandType::Knowledge,
            Self::ExpectAmount { .. } => CommandType::ExpectAmount,
            Self::ExpectFormat { .. } => CommandType::ExpectFormat,
            Self::Postprocess { .. } => CommandType::Postprocess,
            Self::Joker { .. } => CommandType::Joker,
            Self::Foreach { .. } => CommandType::Foreach,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serializes_with_type_tag() {
        let command = Command::Execute {
            execution_type: ExecutionType::PromptTemplate,
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "EXECUTE", "executionType": "PROMPT_TEMPLATE"})
        );
    }

    #[test]
    fn test_parameter_command_serde() {
        let command = Command::Parameter {
            parameter_name: "thing".to_string(),
            parameter_description: Some("Any thing to buy".to_string()),
            is_input: true,
            is_output: false,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert!(json.contains("\"type\":\"PARAMETER\""));
        assert!(json.contains("\"parameterName\":\"thing\""));

        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, command);
        assert_eq!(back.command_type(), CommandType::Parameter);
    }
}
