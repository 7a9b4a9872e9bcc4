//! PROMPTBOOK_URL command

use super::{single_arg, wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{Command, CommandType, CommandUsagePlace, PipelineJson};

const NAME: &str = "PROMPTBOOK_URL";

pub(crate) const PIPELINE_URL_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &["URL"],
    usage_places: &[CommandUsagePlace::PipelineHead],
    description: "Unique URL under which the pipeline is published",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "PROMPTBOOK URL https://promptbook.studio/library/write-cv.ptbk.md",
        "URL https://example.com/promptbook.json",
    ],
    produces: &[CommandType::PromptbookUrl],
    parse,
    stringify,
    apply_to_pipeline: Some(apply_to_pipeline),
    apply_to_template: None,
    take_from_pipeline: Some(take_from_pipeline),
    take_from_template: None,
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let raw_url = single_arg(input, NAME)?;

    let url = ::url::Url::parse(raw_url)
        .map_err(|e| ParseError::invalid(NAME, format!("Invalid URL {raw_url:?}: {e}")))?;

    if url.scheme() != "https" {
        return Err(ParseError::invalid(
            NAME,
            format!("URL must use https, got {raw_url:?}"),
        ));
    }

    Ok(Command::PromptbookUrl {
        pipeline_url: raw_url.to_string(),
    })
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::PromptbookUrl { pipeline_url } => Ok(format!("PROMPTBOOK URL {pipeline_url}")),
        other => Err(wrong_command(NAME, other)),
    }
}

fn apply_to_pipeline(command: &Command, pipeline: &mut PipelineJson) -> Result<()> {
    let Command::PromptbookUrl { pipeline_url } = command else {
        return Err(wrong_command(NAME, command));
    };

    match &pipeline.pipeline_url {
        Some(existing) => {
            log::debug!("Ignoring {NAME} {pipeline_url}, already set to {existing}");
        }
        None => pipeline.pipeline_url = Some(pipeline_url.clone()),
    }

    Ok(())
}

fn take_from_pipeline(pipeline: &PipelineJson) -> Vec<Command> {
    pipeline
        .pipeline_url
        .iter()
        .map(|pipeline_url| Command::PromptbookUrl {
            pipeline_url: pipeline_url.clone(),
        })
        .collect()
}
