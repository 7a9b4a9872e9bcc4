//! PROMPTBOOK_VERSION command

use super::{single_arg, wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{Command, CommandType, CommandUsagePlace, PipelineJson};
use regex::Regex;
use std::sync::LazyLock;

const NAME: &str = "PROMPTBOOK_VERSION";

static SEMANTIC_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$").expect("valid regex")
});

pub(crate) const PROMPTBOOK_VERSION_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &["VERSION"],
    usage_places: &[CommandUsagePlace::PipelineHead],
    description: "Which version of the pipeline language the document is written in",
    documentation_url: DOCUMENTATION_URL,
    examples: &["PROMPTBOOK VERSION 1.0.0", "VERSION 0.61.0-10"],
    produces: &[CommandType::PromptbookVersion],
    parse,
    stringify,
    apply_to_pipeline: Some(apply_to_pipeline),
    apply_to_template: None,
    take_from_pipeline: Some(take_from_pipeline),
    take_from_template: None,
};

/// Whether a string looks like `MAJOR.MINOR.PATCH[-pre][+build]`
pub fn is_valid_semantic_version(version: &str) -> bool {
    SEMANTIC_VERSION_RE.is_match(version)
}

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let version = single_arg(input, NAME)?;

    if !is_valid_semantic_version(version) {
        return Err(ParseError::invalid(
            NAME,
            format!("{version:?} is not a valid semantic version"),
        ));
    }

    Ok(Command::PromptbookVersion {
        promptbook_version: version.to_string(),
    })
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::PromptbookVersion { promptbook_version } => {
            Ok(format!("PROMPTBOOK VERSION {promptbook_version}"))
        }
        other => Err(wrong_command(NAME, other)),
    }
}

fn apply_to_pipeline(command: &Command, pipeline: &mut PipelineJson) -> Result<()> {
    let Command::PromptbookVersion { promptbook_version } = command else {
        return Err(wrong_command(NAME, command));
    };

    match &pipeline.promptbook_version {
        Some(existing) => {
            log::debug!("Ignoring {NAME} {promptbook_version}, already set to {existing}");
        }
        None => pipeline.promptbook_version = Some(promptbook_version.clone()),
    }

    Ok(())
}

fn take_from_pipeline(pipeline: &PipelineJson) -> Vec<Command> {
    pipeline
        .promptbook_version
        .iter()
        .map(|version| Command::PromptbookVersion {
            promptbook_version: version.clone(),
        })
        .collect()
}
