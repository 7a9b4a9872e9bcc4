//! Built-in command grammar
//!
//! One module per command. Each module exposes a `CommandParser` constant
//! wiring its parse, stringify, apply and take hooks together.

mod execute;
mod expect;
mod foreach;
mod joker;
mod knowledge;
mod model;
mod parameter;
mod persona;
mod pipeline_url;
mod postprocess;
mod version;

pub use knowledge::knowledge_source_name;
pub use version::is_valid_semantic_version;

use crate::error::ParseError;
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::Command;

pub(crate) const DOCUMENTATION_URL: &str = "https://github.com/webgptorg/promptbook/discussions";

/// Every command the language knows, in catalog order
pub(crate) fn builtin_parsers() -> Vec<CommandParser> {
    vec![
        pipeline_url::PIPELINE_URL_COMMAND_PARSER,
        version::PROMPTBOOK_VERSION_COMMAND_PARSER,
        parameter::PARAMETER_COMMAND_PARSER,
        execute::EXECUTE_COMMAND_PARSER,
        model::MODEL_COMMAND_PARSER,
        persona::PERSONA_COMMAND_PARSER,
        knowledge::KNOWLEDGE_COMMAND_PARSER,
        expect::EXPECT_COMMAND_PARSER,
        postprocess::POSTPROCESS_COMMAND_PARSER,
        joker::JOKER_COMMAND_PARSER,
        foreach::FOREACH_COMMAND_PARSER,
    ]
}

/// Error for a hook handed a command that belongs to another parser
pub(crate) fn wrong_command(parser: &str, command: &Command) -> ParseError {
    ParseError::WrongCommand {
        parser: parser.to_string(),
        found: command.command_type().to_string(),
    }
}

/// The single argument of a one-argument command
pub(crate) fn single_arg<'a>(input: &'a CommandParserInput<'_>, command: &str) -> Result<&'a str, ParseError> {
    match input.args.as_slice() {
        [arg] => Ok(arg.as_str()),
        [] => Err(ParseError::invalid(command, "requires exactly one argument, none given")),
        args => Err(ParseError::invalid(
            command,
            format!("requires exactly one argument, {} given", args.len()),
        )),
    }
}
