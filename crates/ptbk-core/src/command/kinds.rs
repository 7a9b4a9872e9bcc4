//! Closed vocabularies used as command arguments
//!
//! Every enum here parses case-insensitively from the token written in the
//! markdown source and renders back to its canonical spelling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a command may syntactically appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandUsagePlace {
    /// List items before the first template heading
    PipelineHead,
    /// List items inside a template section
    PipelineTemplate,
}

impl CommandUsagePlace {
    pub const ALL: [CommandUsagePlace; 2] = [Self::PipelineHead, Self::PipelineTemplate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PipelineHead => "PIPELINE_HEAD",
            Self::PipelineTemplate => "PIPELINE_TEMPLATE",
        }
    }
}

impl fmt::Display for CommandUsagePlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical form of a keyword: uppercase, words joined by `_`
///
/// Whitespace and underscores both separate words, so `prompt template`,
/// `PROMPT_TEMPLATE` and `Prompt  _Template` agree.
pub fn canonical_keyword(input: &str) -> String {
    input
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// How a template is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    /// Prompt sent to a language model
    #[default]
    PromptTemplate,
    /// Plain string interpolation, no model call
    SimpleTemplate,
    /// Script evaluated by a script execution backend
    Script,
    /// Ask the user
    PromptDialog,
}

impl ExecutionType {
    pub const ALL: [ExecutionType; 4] = [
        Self::PromptTemplate,
        Self::SimpleTemplate,
        Self::Script,
        Self::PromptDialog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PromptTemplate => "PROMPT_TEMPLATE",
            Self::SimpleTemplate => "SIMPLE_TEMPLATE",
            Self::Script => "SCRIPT",
            Self::PromptDialog => "PROMPT_DIALOG",
        }
    }

    /// Human spelling used when writing the command back to markdown
    pub fn as_words(&self) -> String {
        self.as_str().replace('_', " ").to_lowercase()
    }

    /// Resolve `prompt template`, `PROMPT_TEMPLATE`, `Prompt Template` alike
    pub fn from_keyword(input: &str) -> Option<Self> {
        let keyword = canonical_keyword(input);
        Self::ALL.into_iter().find(|t| t.as_str() == keyword)
    }
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of model a template needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelVariant {
    Completion,
    Chat,
    Embedding,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 3] = [Self::Completion, Self::Chat, Self::Embedding];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completion => "COMPLETION",
            Self::Chat => "CHAT",
            Self::Embedding => "EMBEDDING",
        }
    }

    /// `Chat`, `Completion`, `Embedding`
    pub fn as_title(&self) -> &'static str {
        match self {
            Self::Completion => "Completion",
            Self::Chat => "Chat",
            Self::Embedding => "Embedding",
        }
    }

    pub fn from_keyword(input: &str) -> Option<Self> {
        let keyword = canonical_keyword(input);
        Self::ALL.into_iter().find(|v| v.as_str() == keyword)
    }
}

/// Which model requirement a MODEL command sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelRequirementKey {
    ModelVariant,
    ModelName,
}

impl ModelRequirementKey {
    /// Keyword following `MODEL` in the source
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::ModelVariant => "VARIANT",
            Self::ModelName => "NAME",
        }
    }
}

/// Unit an amount expectation counts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectationUnit {
    Characters,
    Words,
    Sentences,
    Lines,
    Paragraphs,
    Pages,
}

impl ExpectationUnit {
    pub const ALL: [ExpectationUnit; 6] = [
        Self::Characters,
        Self::Words,
        Self::Sentences,
        Self::Lines,
        Self::Paragraphs,
        Self::Pages,
    ];

    /// Plural uppercase spelling, e.g. `LINES`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Characters => "CHARACTERS",
            Self::Words => "WORDS",
            Self::Sentences => "SENTENCES",
            Self::Lines => "LINES",
            Self::Paragraphs => "PARAGRAPHS",
            Self::Pages => "PAGES",
        }
    }

    /// Accepts singular and plural forms in any casing
    pub fn from_keyword(input: &str) -> Option<Self> {
        let keyword = canonical_keyword(input);
        Self::ALL.into_iter().find(|unit| {
            let plural = unit.as_str();
            keyword == plural || keyword == plural[..plural.len() - 1]
        })
    }
}

impl fmt::Display for ExpectationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bound an amount expectation sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectationSign {
    Minimum,
    Maximum,
    Exactly,
}

impl ExpectationSign {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Minimum => "MIN",
            Self::Maximum => "MAX",
            Self::Exactly => "EXACTLY",
        }
    }

    pub fn from_keyword(input: &str) -> Option<Self> {
        match canonical_keyword(input).as_str() {
            "MIN" | "MINIMUM" | "MINIMALLY" => Some(Self::Minimum),
            "MAX" | "MAXIMUM" | "MAXIMALLY" => Some(Self::Maximum),
            "EXACTLY" | "EXACT" => Some(Self::Exactly),
            _ => None,
        }
    }
}

/// Structured format the result must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectFormat {
    Json,
}

impl ExpectFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
        }
    }
}

/// Format a FOREACH command iterates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeachFormat {
    List,
    Csv,
}

impl ForeachFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "LIST",
            Self::Csv => "CSV",
        }
    }

    pub fn from_keyword(input: &str) -> Option<Self> {
        match canonical_keyword(input).as_str() {
            "LIST" => Some(Self::List),
            "CSV" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Cell of the iterated format bound on each iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeachCell {
    Line,
    Row,
    Column,
    Cell,
}

impl ForeachCell {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "LINE",
            Self::Row => "ROW",
            Self::Column => "COLUMN",
            Self::Cell => "CELL",
        }
    }

    pub fn from_keyword(input: &str) -> Option<Self> {
        match canonical_keyword(input).as_str() {
            "LINE" => Some(Self::Line),
            "ROW" => Some(Self::Row),
            "COLUMN" => Some(Self::Column),
            "CELL" => Some(Self::Cell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_keyword() {
        for input in ["prompt template", "PROMPT_TEMPLATE", "Prompt  _Template", " prompt\ttemplate "] {
            assert_eq!(canonical_keyword(input), "PROMPT_TEMPLATE", "{input:?}");
        }
        assert_eq!(canonical_keyword(""), "");
    }

    #[test]
    fn test_execution_type_from_keyword() {
        assert_eq!(
            ExecutionType::from_keyword("prompt template"),
            Some(ExecutionType::PromptTemplate)
        );
        assert_eq!(
            ExecutionType::from_keyword("PROMPT_DIALOG"),
            Some(ExecutionType::PromptDialog)
        );
        assert_eq!(ExecutionType::from_keyword("script prompt template"), None);
        assert_eq!(ExecutionType::SimpleTemplate.as_words(), "simple template");
    }

    #[test]
    fn test_expectation_unit_singular_and_plural() {
        assert_eq!(ExpectationUnit::from_keyword("line"), Some(ExpectationUnit::Lines));
        assert_eq!(ExpectationUnit::from_keyword("WORDS"), Some(ExpectationUnit::Words));
        assert_eq!(ExpectationUnit::from_keyword("Pages"), Some(ExpectationUnit::Pages));
        assert_eq!(ExpectationUnit::from_keyword("tokens"), None);
    }

    #[test]
    fn test_foreach_vocabulary_is_case_insensitive() {
        assert_eq!(ForeachFormat::from_keyword("list"), Some(ForeachFormat::List));
        assert_eq!(ForeachCell::from_keyword("Row"), Some(ForeachCell::Row));
        assert_eq!(ForeachCell::from_keyword("word"), None);
    }
}
