//! Promptbook Parser - command grammar and markdown extraction
//!
//! This crate recognizes the commands written as markdown list items of a
//! pipeline document, turns them into typed [`Command`](ptbk_core::Command)
//! values and splits the document into head and template sections.

mod commands;
pub mod error;
pub mod markdown;
mod parse_command;
pub mod registry;

// Re-export main parser types
pub use commands::{is_valid_semantic_version, knowledge_source_name};
pub use error::{ParseError, Result};
pub use markdown::{extract_pipeline, CodeBlock, CommandLine, ExtractedPipeline, ExtractedSection};
pub use parse_command::{parse_command, parse_command_with};
pub use registry::{CommandParser, CommandParserInput, CommandRegistry};
