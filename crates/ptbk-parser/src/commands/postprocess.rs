//! POSTPROCESS command

use super::{single_arg, wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{Command, CommandType, CommandUsagePlace, PipelineJson, PromptTemplateJson};
use regex::Regex;
use std::sync::LazyLock;

const NAME: &str = "POSTPROCESS";

static FUNCTION_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid regex"));

pub(crate) const POSTPROCESS_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &["POST_PROCESS"],
    usage_places: &[CommandUsagePlace::PipelineTemplate],
    description: "Function applied to the result before expectations are checked",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "POSTPROCESS unwrapResult",
        "POSTPROCESS `trimEndOfCodeBlock`",
        "POST PROCESS removeQuotes",
    ],
    produces: &[CommandType::Postprocess],
    parse,
    stringify,
    apply_to_pipeline: None,
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: None,
    take_from_template: Some(take_from_template),
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let function_name = single_arg(input, NAME)?;

    if !FUNCTION_NAME_RE.is_match(function_name) {
        return Err(ParseError::invalid(
            NAME,
            format!("{function_name:?} is not a valid function name"),
        ));
    }

    Ok(Command::Postprocess {
        function_name: function_name.to_string(),
    })
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::Postprocess { function_name } => Ok(format!("POSTPROCESS `{function_name}`")),
        other => Err(wrong_command(NAME, other)),
    }
}

fn apply_to_template(
    command: &Command,
    template: &mut PromptTemplateJson,
    _pipeline: &mut PipelineJson,
) -> Result<()> {
    let Command::Postprocess { function_name } = command else {
        return Err(wrong_command(NAME, command));
    };

    // Order matters, the same function may run twice
    template.postprocessing_function_names.push(function_name.clone());
    Ok(())
}

fn take_from_template(template: &PromptTemplateJson, _pipeline: &PipelineJson) -> Vec<Command> {
    template
        .postprocessing_function_names
        .iter()
        .map(|function_name| Command::Postprocess {
            function_name: function_name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_command;

    #[test]
    fn test_parse_postprocess() {
        let command =
            parse_command("post process removeQuotes", CommandUsagePlace::PipelineTemplate).unwrap();
        assert_eq!(
            command,
            Command::Postprocess {
                function_name: "removeQuotes".to_string()
            }
        );
    }

    #[test]
    fn test_function_name_is_validated() {
        let err = parse_command("POSTPROCESS remove-quotes", CommandUsagePlace::PipelineTemplate)
            .unwrap_err();
        assert!(err.to_string().contains("not a valid function name"));

        let err = parse_command("POSTPROCESS a b", CommandUsagePlace::PipelineTemplate).unwrap_err();
        assert!(err.to_string().contains("exactly one argument"));
    }

    #[test]
    fn test_functions_keep_order() {
        let mut pipeline = PipelineJson::new("Test");
        let mut template = PromptTemplateJson::new("Step", "", "result");
        for name in ["trim", "unwrapResult", "trim"] {
            let command = Command::Postprocess {
                function_name: name.to_string(),
            };
            apply_to_template(&command, &mut template, &mut pipeline).unwrap();
        }
        assert_eq!(
            template.postprocessing_function_names,
            vec!["trim", "unwrapResult", "trim"]
        );
        assert_eq!(take_from_template(&template, &pipeline).len(), 3);
    }
}
