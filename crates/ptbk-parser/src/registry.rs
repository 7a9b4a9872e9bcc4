//! Command grammar registry
//!
//! Maps every command name and alias to exactly one [`CommandParser`]. The
//! built-in registry is assembled once on first use and is read-only
//! afterwards, so any number of parses can share it.

use crate::commands;
use crate::error::{ParseError, Result};
use ptbk_core::{
    canonical_keyword, Command, CommandType, CommandUsagePlace, PipelineJson, PromptTemplateJson,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Parse hook: tokens of one line to a typed command
pub type ParseFn = fn(&CommandParserInput<'_>) -> Result<Command>;

/// Stringify hook: typed command back to one markdown line
pub type StringifyFn = fn(&Command) -> Result<String>;

/// Apply a head command to the pipeline under construction
pub type ApplyToPipelineFn = fn(&Command, &mut PipelineJson) -> Result<()>;

/// Apply a template command to the template (and pipeline) under construction
pub type ApplyToTemplateFn = fn(&Command, &mut PromptTemplateJson, &mut PipelineJson) -> Result<()>;

/// Recover head commands from a compiled pipeline
pub type TakeFromPipelineFn = fn(&PipelineJson) -> Vec<Command>;

/// Recover template commands from a compiled template
pub type TakeFromTemplateFn = fn(&PromptTemplateJson, &PipelineJson) -> Vec<Command>;

/// One entry of the command grammar
#[derive(Clone, Copy)]
pub struct CommandParser {
    /// Canonical name, words joined by `_`
    pub name: &'static str,

    /// Alternate names, words joined by `_`
    pub alias_names: &'static [&'static str],

    /// Sections where the command is legal
    pub usage_places: &'static [CommandUsagePlace],

    pub description: &'static str,

    pub documentation_url: &'static str,

    /// Sample lines; every one of them must parse
    pub examples: &'static [&'static str],

    /// Command types the parse hook can produce
    pub produces: &'static [CommandType],

    pub parse: ParseFn,

    pub stringify: StringifyFn,

    pub apply_to_pipeline: Option<ApplyToPipelineFn>,

    pub apply_to_template: Option<ApplyToTemplateFn>,

    pub take_from_pipeline: Option<TakeFromPipelineFn>,

    pub take_from_template: Option<TakeFromTemplateFn>,
}

impl CommandParser {
    pub fn is_used_in_pipeline_head(&self) -> bool {
        self.is_used_in(CommandUsagePlace::PipelineHead)
    }

    pub fn is_used_in_pipeline_template(&self) -> bool {
        self.is_used_in(CommandUsagePlace::PipelineTemplate)
    }

    pub fn is_used_in(&self, place: CommandUsagePlace) -> bool {
        self.usage_places.contains(&place)
    }

    /// Canonical name followed by the aliases
    pub fn keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.alias_names.iter().copied())
    }
}

impl fmt::Debug for CommandParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandParser")
            .field("name", &self.name)
            .field("alias_names", &self.alias_names)
            .field("usage_places", &self.usage_places)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

/// Tokens of one command line handed to a parse hook
#[derive(Debug, Clone)]
pub struct CommandParserInput<'a> {
    /// The whole line, trimmed
    pub raw: &'a str,

    /// Matched name or alias in canonical form, e.g. `INPUT_PARAMETER`
    pub keyword: String,

    /// Every token uppercased and joined by `_`
    pub normalized: String,

    /// Tokens after the keyword, backtick quoting removed
    pub args: Vec<String>,

    pub usage_place: CommandUsagePlace,

    /// Byte offset of each argument inside `raw`
    pub(crate) arg_offsets: Vec<usize>,
}

impl<'a> CommandParserInput<'a> {
    /// Source text from argument `index` to the end of the line, quoting kept
    pub fn raw_args_from(&self, index: usize) -> &'a str {
        match self.arg_offsets.get(index) {
            Some(offset) => self.raw[*offset..].trim(),
            None => "",
        }
    }
}

/// The closed catalog of commands
#[derive(Debug)]
pub struct CommandRegistry {
    parsers: Vec<CommandParser>,
    /// Keyword -> index into `parsers`
    keywords: HashMap<String, usize>,
    /// Largest number of words in any keyword
    longest_keyword: usize,
}

static BUILTIN_REGISTRY: LazyLock<CommandRegistry> = LazyLock::new(|| {
    CommandRegistry::new(commands::builtin_parsers())
        .unwrap_or_else(|e| panic!("built-in command grammar is inconsistent: {e}"))
});

impl CommandRegistry {
    /// Build a registry, rejecting any keyword claimed by two commands
    pub fn new(parsers: Vec<CommandParser>) -> Result<Self> {
        let mut keywords: HashMap<String, usize> = HashMap::new();
        let mut producers: HashMap<CommandType, &'static str> = HashMap::new();
        let mut longest_keyword = 0;

        for (index, parser) in parsers.iter().enumerate() {
            if parser.usage_places.is_empty() {
                return Err(ParseError::Registry(format!(
                    "command {} is not usable anywhere",
                    parser.name
                )));
            }

            for keyword in parser.keywords() {
                let canonical = canonical_keyword(keyword);
                if canonical.is_empty() {
                    return Err(ParseError::Registry(format!(
                        "command {} has an empty name or alias",
                        parser.name
                    )));
                }

                longest_keyword = longest_keyword.max(canonical.split('_').count());

                if let Some(existing) = keywords.insert(canonical.clone(), index) {
                    return Err(ParseError::Registry(format!(
                        "keyword {} is claimed by both {} and {}",
                        canonical, parsers[existing].name, parser.name
                    )));
                }
            }

            for command_type in parser.produces {
                if let Some(existing) = producers.insert(*command_type, parser.name) {
                    return Err(ParseError::Registry(format!(
                        "command type {} is produced by both {} and {}",
                        command_type, existing, parser.name
                    )));
                }
            }
        }

        Ok(Self {
            parsers,
            keywords,
            longest_keyword,
        })
    }

    /// The built-in grammar
    pub fn builtin() -> &'static CommandRegistry {
        &BUILTIN_REGISTRY
    }

    pub fn parsers(&self) -> &[CommandParser] {
        &self.parsers
    }

    /// Look up a command by name or alias, case-insensitively
    pub fn get(&self, name: &str) -> Option<&CommandParser> {
        self.keywords
            .get(&canonical_keyword(name))
            .map(|index| &self.parsers[*index])
    }

    /// Find the parser owning a command type
    pub fn parser_for(&self, command_type: CommandType) -> Option<&CommandParser> {
        self.parsers
            .iter()
            .find(|parser| parser.produces.contains(&command_type))
    }

    /// Match the longest leading token sequence against the known keywords
    ///
    /// Returns the parser, the number of tokens consumed and the canonical
    /// keyword that matched.
    pub fn match_keyword(&self, tokens: &[String]) -> Option<(&CommandParser, usize, String)> {
        let max_words = tokens.len().min(self.longest_keyword.max(1));

        for count in (1..=max_words).rev() {
            let words: Vec<&str> = tokens[..count].iter().map(String::as_str).collect();
            let keyword = canonical_keyword(&words.join(" "));
            if let Some(index) = self.keywords.get(&keyword) {
                return Some((&self.parsers[*index], count, keyword));
            }
        }

        None
    }

    /// Write a command back as one markdown list-item line (without the bullet)
    pub fn stringify(&self, command: &Command) -> Result<String> {
        let parser = self.require_parser(command)?;
        (parser.stringify)(command)
    }

    pub(crate) fn require_parser(&self, command: &Command) -> Result<&CommandParser> {
        self.parser_for(command.command_type()).ok_or_else(|| {
            ParseError::Registry(format!(
                "no parser registered for {}",
                command.command_type()
            ))
        })
    }

    /// Fold a head command into the pipeline under construction
    pub fn apply_to_pipeline(&self, command: &Command, pipeline: &mut PipelineJson) -> Result<()> {
        let parser = self.require_parser(command)?;
        match parser.apply_to_pipeline {
            Some(apply) => apply(command, pipeline),
            None => Err(ParseError::NotAllowedHere {
                command: parser.name.to_string(),
                place: CommandUsagePlace::PipelineHead,
                raw: self.stringify(command).unwrap_or_default(),
            }),
        }
    }

    /// Fold a template command into the template under construction
    pub fn apply_to_template(
        &self,
        command: &Command,
        template: &mut PromptTemplateJson,
        pipeline: &mut PipelineJson,
    ) -> Result<()> {
        let parser = self.require_parser(command)?;
        match parser.apply_to_template {
            Some(apply) => apply(command, template, pipeline),
            None => Err(ParseError::NotAllowedHere {
                command: parser.name.to_string(),
                place: CommandUsagePlace::PipelineTemplate,
                raw: self.stringify(command).unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_resolves_aliases() {
        let registry = CommandRegistry::builtin();
        assert_eq!(registry.get("version").unwrap().name, "PROMPTBOOK_VERSION");
        assert_eq!(registry.get("Promptbook Version").unwrap().name, "PROMPTBOOK_VERSION");
        assert_eq!(registry.get("for").unwrap().name, "FOREACH");
        assert_eq!(registry.get("input parameter").unwrap().name, "PARAMETER");
        assert!(registry.get("nothing").is_none());
    }

    #[test]
    fn test_duplicate_alias_is_rejected_at_build_time() {
        let mut parsers = commands::builtin_parsers();
        let mut clone = parsers[0];
        clone.name = "SOMETHING_ELSE";
        clone.produces = &[];
        parsers.push(clone);

        let err = CommandRegistry::new(parsers).unwrap_err();
        assert!(matches!(err, ParseError::Registry(_)));
        assert!(err.to_string().contains("claimed by both"));
    }

    #[test]
    fn test_match_keyword_prefers_longest() {
        let registry = CommandRegistry::builtin();
        let tokens: Vec<String> = ["input", "parameter", "{thing}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (parser, consumed, keyword) = registry.match_keyword(&tokens).unwrap();
        assert_eq!(parser.name, "PARAMETER");
        assert_eq!(consumed, 2);
        assert_eq!(keyword, "INPUT_PARAMETER");
    }

    #[test]
    fn test_every_command_type_has_a_parser() {
        let registry = CommandRegistry::builtin();
        for command_type in [
            CommandType::PromptbookUrl,
            CommandType::PromptbookVersion,
            CommandType::Parameter,
            CommandType::Execute,
            CommandType::Model,
            CommandType::Persona,
            CommandType::Knowledge,
            CommandType::ExpectAmount,
            CommandType::ExpectFormat,
            CommandType::Postprocess,
            CommandType::Joker,
            CommandType::Foreach,
        ] {
            assert!(registry.parser_for(command_type).is_some(), "{command_type}");
        }
    }
}
