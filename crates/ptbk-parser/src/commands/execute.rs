//! EXECUTE command

use super::{wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{
    Command, CommandType, CommandUsagePlace, ExecutionType, PipelineJson, PromptTemplateJson,
};

const NAME: &str = "EXECUTE";

pub(crate) const EXECUTE_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &["EXEC"],
    usage_places: &[CommandUsagePlace::PipelineTemplate],
    description: "How the template is executed: prompt, simple interpolation, script or dialog",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "EXECUTE PROMPT TEMPLATE",
        "EXECUTE SIMPLE TEMPLATE",
        "EXECUTE SCRIPT",
        "EXECUTE PROMPT DIALOG",
        "execute prompt template",
        "EXEC `prompt dialog`",
        "EXECUTE PROMPT_TEMPLATE",
    ],
    produces: &[CommandType::Execute],
    parse,
    stringify,
    apply_to_pipeline: None,
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: None,
    take_from_template: Some(take_from_template),
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let subtype = input.args.join(" ");

    let execution_type = ExecutionType::from_keyword(&subtype).ok_or_else(|| {
        let known = ExecutionType::ALL
            .iter()
            .map(ExecutionType::as_words)
            .collect::<Vec<_>>()
            .join(", ");
        ParseError::invalid(
            NAME,
            format!("Unknown execution type {subtype:?}, expected one of: {known}"),
        )
    })?;

    Ok(Command::Execute { execution_type })
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::Execute { execution_type } => Ok(format!(
            "EXECUTE {}",
            execution_type.as_words().to_uppercase()
        )),
        other => Err(wrong_command(NAME, other)),
    }
}

fn apply_to_template(
    command: &Command,
    template: &mut PromptTemplateJson,
    _pipeline: &mut PipelineJson,
) -> Result<()> {
    let Command::Execute { execution_type } = command else {
        return Err(wrong_command(NAME, command));
    };

    let current = template.execution_type;
    if current != ExecutionType::default() && current != *execution_type {
        return Err(ParseError::conflict(
            NAME,
            format!(
                "template {:?} is already executed as {current}, can not change it to {execution_type}",
                template.title
            ),
        ));
    }

    template.execution_type = *execution_type;
    Ok(())
}

fn take_from_template(template: &PromptTemplateJson, _pipeline: &PipelineJson) -> Vec<Command> {
    if template.execution_type == ExecutionType::default() {
        return Vec::new();
    }

    vec![Command::Execute {
        execution_type: template.execution_type,
    }]
}
