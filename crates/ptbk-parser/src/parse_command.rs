//! Command line parsing
//!
//! Turns one list-item line into a typed [`Command`]:
//! 1. reject multi-line and empty input
//! 2. split into whitespace separated tokens, backticks quote spaces
//! 3. match the longest leading keyword against the registry
//! 4. check the command is legal in the usage place
//! 5. hand the remaining tokens to the command's own parse hook

use crate::error::{ParseError, Result};
use crate::registry::{CommandParserInput, CommandRegistry};
use ptbk_core::{Command, CommandUsagePlace};

/// One token with its byte offset in the source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub text: String,
    pub offset: usize,
}

/// Split a line into tokens
///
/// Runs of whitespace separate tokens. A backtick toggles quoting; inside
/// quotes whitespace belongs to the token. The backticks themselves are
/// dropped from the token text.
pub(crate) fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start: Option<usize> = None;
    let mut quoted = false;

    for (offset, ch) in line.char_indices() {
        if ch == '`' {
            quoted = !quoted;
            start.get_or_insert(offset);
            continue;
        }

        if ch.is_whitespace() && !quoted {
            if let Some(token_start) = start.take() {
                tokens.push(Token {
                    text: std::mem::take(&mut current),
                    offset: token_start,
                });
            }
            continue;
        }

        start.get_or_insert(offset);
        current.push(ch);
    }

    if let Some(token_start) = start {
        tokens.push(Token {
            text: current,
            offset: token_start,
        });
    }

    tokens.retain(|token| !token.text.is_empty());
    tokens
}

/// Parse one command line using the built-in grammar
pub fn parse_command(input: &str, usage_place: CommandUsagePlace) -> Result<Command> {
    parse_command_with(CommandRegistry::builtin(), input, usage_place)
}

/// Parse one command line against a specific registry
pub fn parse_command_with(
    registry: &CommandRegistry,
    input: &str,
    usage_place: CommandUsagePlace,
) -> Result<Command> {
    if input.contains('\n') || input.contains('\r') {
        return Err(ParseError::NewLine(input.to_string()));
    }

    let raw = input.trim();
    if raw.is_empty() {
        return Err(ParseError::Malformed(input.to_string()));
    }

    let tokens = tokenize(raw);
    if tokens.is_empty() {
        return Err(ParseError::Malformed(input.to_string()));
    }

    let texts: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
    let (parser, consumed, keyword) = registry
        .match_keyword(&texts)
        .ok_or_else(|| ParseError::UnknownCommand(raw.to_string()))?;

    if !parser.is_used_in(usage_place) {
        return Err(ParseError::NotAllowedHere {
            command: parser.name.to_string(),
            place: usage_place,
            raw: raw.to_string(),
        });
    }

    let normalized = texts
        .iter()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join("_"))
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase();

    let parser_input = CommandParserInput {
        raw,
        keyword,
        normalized,
        args: texts[consumed..].to_vec(),
        usage_place,
        arg_offsets: tokens[consumed..].iter().map(|t| t.offset).collect(),
    };

    (parser.parse)(&parser_input)
}
