//! JOKER command
//!
//! A joker parameter short-circuits its template: when the joker already
//! satisfies the expectations, the template is not executed at all.

use super::{single_arg, wrong_command, DOCUMENTATION_URL};
use crate::error::Result;
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{
    validate_parameter_name, Command, CommandType, CommandUsagePlace, PipelineJson,
    PromptTemplateJson,
};

const NAME: &str = "JOKER";

pub(crate) const JOKER_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &[],
    usage_places: &[CommandUsagePlace::PipelineTemplate],
    description: "Parameter used as the result when it already meets the expectations",
    documentation_url: DOCUMENTATION_URL,
    examples: &["JOKER {documentTitle}", "joker `{name}`"],
    produces: &[CommandType::Joker],
    parse,
    stringify,
    apply_to_pipeline: None,
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: None,
    take_from_template: Some(take_from_template),
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let raw_name = single_arg(input, NAME)?;
    Ok(Command::Joker {
        parameter_name: validate_parameter_name(raw_name)?,
    })
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::Joker { parameter_name } => Ok(format!("JOKER {{{parameter_name}}}")),
        other => Err(wrong_command(NAME, other)),
    }
}

fn apply_to_template(
    command: &Command,
    template: &mut PromptTemplateJson,
    _pipeline: &mut PipelineJson,
) -> Result<()> {
    let Command::Joker { parameter_name } = command else {
        return Err(wrong_command(NAME, command));
    };

    if !template.joker_parameter_names.contains(parameter_name) {
        template.joker_parameter_names.push(parameter_name.clone());
    }
    Ok(())
}

fn take_from_template(template: &PromptTemplateJson, _pipeline: &PipelineJson) -> Vec<Command> {
    template
        .joker_parameter_names
        .iter()
        .map(|parameter_name| Command::Joker {
            parameter_name: parameter_name.clone(),
        })
        .collect()
}
