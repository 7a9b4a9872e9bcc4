//! FOREACH command
//!
//! `FOREACH List Line -> {customer}` runs the template once per line of a
//! list. Only parsing is available; folding into a template and writing the
//! command back fail with [`ParseError::NotImplemented`] until iteration
//! semantics exist in the compiled model.

use super::{wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{
    validate_parameter_name, Command, CommandType, CommandUsagePlace, ForeachCell, ForeachFormat,
    PipelineJson, PromptTemplateJson,
};

const NAME: &str = "FOREACH";

pub(crate) const FOREACH_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &["FOR", "EACH"],
    usage_places: &[CommandUsagePlace::PipelineTemplate],
    description: "Iterate the template over the cells of a list or table parameter",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "FOREACH List Line -> `{customer}`",
        "FOR List Line -> `{customer}`",
        "EACH List Line -> `{customer}`",
        "FOREACH Csv Row -> {row}",
    ],
    produces: &[CommandType::Foreach],
    parse,
    stringify,
    apply_to_pipeline: None,
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: None,
    take_from_template: None,
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let arg = |index: usize| input.args.get(index).map(String::as_str).unwrap_or_default();

    let format_name = ForeachFormat::from_keyword(arg(0)).ok_or_else(|| {
        ParseError::invalid(NAME, "FOREACH command must have 'LIST' or 'CSV' as the first argument")
    })?;

    let cell_name = ForeachCell::from_keyword(arg(1)).ok_or_else(|| {
        ParseError::invalid(
            NAME,
            format!(
                "Format {} does not support cell \"{}\"",
                format_name.as_str(),
                arg(1)
            ),
        )
    })?;

    if arg(2) != "->" {
        return Err(ParseError::invalid(
            NAME,
            "FOREACH command must have '->' to assign the value to the parameter",
        ));
    }

    if input.args.len() != 4 {
        return Err(ParseError::invalid(
            NAME,
            "FOREACH command must end with exactly one parameter name",
        ));
    }

    Ok(Command::Foreach {
        format_name,
        cell_name,
        parameter_name: validate_parameter_name(arg(3))?,
    })
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::Foreach { .. } => Err(ParseError::not_implemented(NAME, "stringify")),
        other => Err(wrong_command(NAME, other)),
    }
}

fn apply_to_template(
    command: &Command,
    _template: &mut PromptTemplateJson,
    _pipeline: &mut PipelineJson,
) -> Result<()> {
    match command {
        Command::Foreach { .. } => Err(ParseError::not_implemented(NAME, "apply to template")),
        other => Err(wrong_command(NAME, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_command;

    fn parse_foreach(line: &str) -> Result<Command> {
        parse_command(line, CommandUsagePlace::PipelineTemplate)
    }

    #[test]
    fn test_parse_foreach_and_aliases() {
        for line in [
            "FOREACH List Line -> `{customer}`",
            "FOR List Line -> `{customer}`",
            "each list line -> {customer}",
        ] {
            assert_eq!(
                parse_foreach(line).unwrap(),
                Command::Foreach {
                    format_name: ForeachFormat::List,
                    cell_name: ForeachCell::Line,
                    parameter_name: "customer".to_string(),
                },
                "{line}"
            );
        }
    }

    #[test]
    fn test_foreach_errors() {
        for (line, phrase) in [
            ("FOREACH Tree Line -> {x}", "'LIST' or 'CSV'"),
            ("FOREACH List Leaf -> {x}", "does not support cell \"Leaf\""),
            ("FOREACH List Line {x}", "'->'"),
            ("FOREACH List Line ->", "exactly one parameter name"),
            ("FOREACH List Line -> {a} {b}", "exactly one parameter name"),
        ] {
            let err = parse_foreach(line).unwrap_err();
            assert!(err.to_string().contains(phrase), "{line}: {err}");
        }
    }

    #[test]
    fn test_unimplemented_hooks_fail_loudly() {
        let command = parse_foreach("FOREACH Csv Cell -> {cell}").unwrap();
        let mut pipeline = PipelineJson::new("Test");
        let mut template = PromptTemplateJson::new("Step", "", "result");

        let err = stringify(&command).unwrap_err();
        assert!(err.is_not_implemented());

        let err = apply_to_template(&command, &mut template, &mut pipeline).unwrap_err();
        assert!(err.is_not_implemented());
        assert_eq!(template, PromptTemplateJson::new("Step", "", "result"));
    }
}
