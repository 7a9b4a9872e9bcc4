//! Promptbook Compiler - markdown to PipelineJson
//!
//! This crate compiles pipeline documents into `PipelineJson`, validates the
//! result and writes it back as markdown.

pub mod collection;
pub mod compiler;
pub mod error;
pub mod mermaid;
pub mod prepare;
pub mod stringify;
pub mod validator;

// Re-export main types
pub use compiler::{compile_pipeline, CompilerOptions, PipelineCompiler};
pub use error::{CompileError, Result};
pub use validator::{collect_violations, validate_pipeline, ValidationError, Violation};

// Re-export output helpers
pub use collection::PipelineCollection;
pub use mermaid::{render_pipeline_mermaid, LinkTemplate, MermaidLink};
pub use prepare::{is_pipeline_prepared, unprepare_pipeline};
pub use stringify::{stringify_pipeline, stringify_pipeline_with};
