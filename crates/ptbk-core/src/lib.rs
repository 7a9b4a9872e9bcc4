//! Promptbook Core - shared types for the promptbook pipeline language
//!
//! This crate provides the fundamental types used by the parser and compiler:
//! - `Command`, the typed form of one markdown list-item directive
//! - `PipelineJson`, the compiled and serializable pipeline
//! - Parameter name normalization and validation
//! - Error types

pub mod command;
pub mod error;
pub mod naming;
pub mod pipeline;

// Re-export commonly used types
pub use command::{
    canonical_keyword, Command, CommandType, CommandUsagePlace, ExecutionType, ExpectFormat, ExpectationSign,
    ExpectationUnit, ForeachCell, ForeachFormat, ModelRequirementKey, ModelVariant,
};
pub use error::{CoreError, Result};
pub use naming::{
    extract_parameter_names, is_reserved_parameter_name, normalize_to_camel_case, title_to_name,
    validate_parameter_name, RESERVED_PARAMETER_NAMES,
};
pub use pipeline::{
    ExpectationRange, KnowledgeSourceJson, ModelRequirements, ParameterJson, PersonaJson,
    PipelineJson, PromptTemplateJson,
};
