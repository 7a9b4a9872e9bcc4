//! PARAMETER command
//!
//! `INPUT PARAMETER {thing} Any thing to buy` declares a pipeline input,
//! `OUTPUT PARAMETER {response}` an output and plain `PARAMETER {x}` an
//! intermediate value.

use super::{wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{
    validate_parameter_name, Command, CommandType, CommandUsagePlace, ParameterJson, PipelineJson,
    PromptTemplateJson,
};

const NAME: &str = "PARAMETER";

pub(crate) const PARAMETER_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &["INPUT_PARAMETER", "OUTPUT_PARAMETER"],
    usage_places: &[CommandUsagePlace::PipelineHead, CommandUsagePlace::PipelineTemplate],
    description: "Declares a parameter with optional description and input/output flag",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "PARAMETER {title} Title of the book",
        "INPUT PARAMETER {thing} Any thing to buy",
        "OUTPUT PARAMETER `{response}`",
        "input parameter {name}",
    ],
    produces: &[CommandType::Parameter],
    parse,
    stringify,
    apply_to_pipeline: Some(apply_to_pipeline),
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: Some(take_from_pipeline),
    take_from_template: None,
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let raw_name = input
        .args
        .first()
        .ok_or_else(|| ParseError::invalid(NAME, "requires a parameter name"))?;

    let parameter_name = validate_parameter_name(raw_name)?;

    let description = input.raw_args_from(1);
    let parameter_description = (!description.is_empty()).then(|| description.to_string());

    Ok(Command::Parameter {
        parameter_name,
        parameter_description,
        is_input: input.keyword.starts_with("INPUT"),
        is_output: input.keyword.starts_with("OUTPUT"),
    })
}

fn stringify(command: &Command) -> Result<String> {
    let Command::Parameter {
        parameter_name,
        parameter_description,
        is_input,
        is_output,
    } = command
    else {
        return Err(wrong_command(NAME, command));
    };

    let keyword = match (is_input, is_output) {
        (true, false) => "INPUT PARAMETER",
        (false, true) => "OUTPUT PARAMETER",
        (false, false) => "PARAMETER",
        (true, true) => {
            return Err(ParseError::invalid(
                NAME,
                format!("{{{parameter_name}}} can not be both input and output"),
            ))
        }
    };

    Ok(match parameter_description {
        Some(description) => format!("{keyword} {{{parameter_name}}} {description}"),
        None => format!("{keyword} {{{parameter_name}}}"),
    })
}

fn declare(command: &Command, pipeline: &mut PipelineJson) -> Result<()> {
    let Command::Parameter {
        parameter_name,
        parameter_description,
        is_input,
        is_output,
    } = command
    else {
        return Err(wrong_command(NAME, command));
    };

    if pipeline.parameter(parameter_name).is_some() {
        return Err(ParseError::conflict(
            NAME,
            format!("parameter {{{parameter_name}}} is declared more than once"),
        ));
    }

    pipeline.parameters.push(ParameterJson {
        name: parameter_name.clone(),
        description: parameter_description.clone(),
        is_input: *is_input,
        is_output: *is_output,
    });

    Ok(())
}

fn apply_to_pipeline(command: &Command, pipeline: &mut PipelineJson) -> Result<()> {
    declare(command, pipeline)
}

fn apply_to_template(
    command: &Command,
    _template: &mut PromptTemplateJson,
    pipeline: &mut PipelineJson,
) -> Result<()> {
    declare(command, pipeline)
}

fn take_from_pipeline(pipeline: &PipelineJson) -> Vec<Command> {
    pipeline
        .parameters
        .iter()
        .map(|parameter| Command::Parameter {
            parameter_name: parameter.name.clone(),
            parameter_description: parameter.description.clone(),
            is_input: parameter.is_input,
            is_output: parameter.is_output,
        })
        .collect()
}
