//! PERSONA command
//!
//! `PERSONA Jane, skilled copywriter` registers the persona `Jane` on the
//! pipeline. Used in a template it also makes the template speak as Jane.

use super::{wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{
    Command, CommandType, CommandUsagePlace, PersonaJson, PipelineJson, PromptTemplateJson,
};

const NAME: &str = "PERSONA";

pub(crate) const PERSONA_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &[],
    usage_places: &[CommandUsagePlace::PipelineHead, CommandUsagePlace::PipelineTemplate],
    description: "Persona the model impersonates, with an optional description",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "PERSONA Jane, skilled copywriter",
        "PERSONA Joe, lawyer from New York",
        "persona Paul",
    ],
    produces: &[CommandType::Persona],
    parse,
    stringify,
    apply_to_pipeline: Some(apply_to_pipeline),
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: Some(take_from_pipeline),
    take_from_template: Some(take_from_template),
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let raw = input.raw_args_from(0);

    let (name, description) = match raw.split_once(',') {
        Some((name, description)) => (name, description.trim()),
        None => (raw, ""),
    };

    let persona_name = name.trim().trim_matches('`').trim();
    if persona_name.is_empty() {
        return Err(ParseError::invalid(NAME, "requires a persona name"));
    }

    Ok(Command::Persona {
        persona_name: persona_name.to_string(),
        persona_description: (!description.is_empty()).then(|| description.to_string()),
    })
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::Persona {
            persona_name,
            persona_description: Some(description),
        } => Ok(format!("PERSONA {persona_name}, {description}")),
        Command::Persona {
            persona_name,
            persona_description: None,
        } => Ok(format!("PERSONA {persona_name}")),
        other => Err(wrong_command(NAME, other)),
    }
}

/// Merge a description into a persona's existing one
///
/// Repeated or already contained descriptions are kept once.
fn merge_description(existing: &mut String, addition: &str) {
    let addition = addition.trim();
    if addition.is_empty() || existing.contains(addition) {
        return;
    }

    if existing.is_empty() {
        existing.push_str(addition);
    } else {
        existing.push(' ');
        existing.push_str(addition);
    }
}

fn register(command: &Command, pipeline: &mut PipelineJson) -> Result<String> {
    let Command::Persona {
        persona_name,
        persona_description,
    } = command
    else {
        return Err(wrong_command(NAME, command));
    };

    let description = persona_description.as_deref().unwrap_or_default();

    match pipeline.personas.iter_mut().find(|p| &p.name == persona_name) {
        Some(persona) => merge_description(&mut persona.description, description),
        None => pipeline
            .personas
            .push(PersonaJson::new(persona_name.clone(), description.trim())),
    }

    Ok(persona_name.clone())
}

fn apply_to_pipeline(command: &Command, pipeline: &mut PipelineJson) -> Result<()> {
    register(command, pipeline).map(|_| ())
}

fn apply_to_template(
    command: &Command,
    template: &mut PromptTemplateJson,
    pipeline: &mut PipelineJson,
) -> Result<()> {
    let Command::Persona { persona_name, .. } = command else {
        return Err(wrong_command(NAME, command));
    };

    if let Some(existing) = &template.persona_name {
        if existing != persona_name {
            return Err(ParseError::conflict(
                NAME,
                format!(
                    "template {:?} already speaks as {existing}, can not also speak as {persona_name}",
                    template.title
                ),
            ));
        }
    }

    template.persona_name = Some(register(command, pipeline)?);
    Ok(())
}

fn take_from_pipeline(pipeline: &PipelineJson) -> Vec<Command> {
    pipeline
        .personas
        .iter()
        .map(|persona| Command::Persona {
            persona_name: persona.name.clone(),
            persona_description: (!persona.description.is_empty())
                .then(|| persona.description.clone()),
        })
        .collect()
}

fn take_from_template(template: &PromptTemplateJson, _pipeline: &PipelineJson) -> Vec<Command> {
    template
        .persona_name
        .iter()
        .map(|persona_name| Command::Persona {
            persona_name: persona_name.clone(),
            persona_description: None,
        })
        .collect()
}
