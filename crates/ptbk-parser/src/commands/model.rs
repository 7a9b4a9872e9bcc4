//! MODEL command
//!
//! In the head it sets the pipeline defaults, in a template the template's
//! own requirements.

use super::{wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{
    Command, CommandType, CommandUsagePlace, ModelRequirementKey, ModelRequirements, ModelVariant,
    PipelineJson, PromptTemplateJson,
};

const NAME: &str = "MODEL";

pub(crate) const MODEL_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &[],
    usage_places: &[CommandUsagePlace::PipelineHead, CommandUsagePlace::PipelineTemplate],
    description: "Requirements the executing model must satisfy",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "MODEL VARIANT Chat",
        "MODEL VARIANT Completion",
        "MODEL NAME gpt-4",
        "MODEL NAME `gpt-3.5-turbo-instruct`",
    ],
    produces: &[CommandType::Model],
    parse,
    stringify,
    apply_to_pipeline: Some(apply_to_pipeline),
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: Some(take_from_pipeline),
    take_from_template: Some(take_from_template),
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let (key, values) = match input.args.split_first() {
        Some((key, values)) => (key.to_uppercase(), values),
        None => return Err(ParseError::invalid(NAME, "requires VARIANT or NAME")),
    };

    match key.as_str() {
        "VARIANT" => {
            let raw = values.join(" ");
            let variant = ModelVariant::from_keyword(&raw).ok_or_else(|| {
                ParseError::invalid(
                    NAME,
                    format!("Unknown model variant {raw:?}, expected Completion, Chat or Embedding"),
                )
            })?;
            Ok(Command::Model {
                key: ModelRequirementKey::ModelVariant,
                value: variant.as_str().to_string(),
            })
        }
        "NAME" => match values {
            [model_name] => Ok(Command::Model {
                key: ModelRequirementKey::ModelName,
                value: model_name.clone(),
            }),
            _ => Err(ParseError::invalid(NAME, "MODEL NAME requires exactly one model name")),
        },
        _ => Err(ParseError::invalid(
            NAME,
            format!("Unknown model key {key:?}, expected VARIANT or NAME"),
        )),
    }
}

fn stringify(command: &Command) -> Result<String> {
    let Command::Model { key, value } = command else {
        return Err(wrong_command(NAME, command));
    };

    match key {
        ModelRequirementKey::ModelVariant => {
            let variant = ModelVariant::from_keyword(value).ok_or_else(|| {
                ParseError::invalid(NAME, format!("Unknown model variant {value:?}"))
            })?;
            Ok(format!("MODEL VARIANT {}", variant.as_title()))
        }
        ModelRequirementKey::ModelName => Ok(format!("MODEL NAME `{value}`")),
    }
}

/// Set one requirement, or report the value it already has when it differs
fn set_requirement(
    requirements: &mut ModelRequirements,
    key: ModelRequirementKey,
    value: &str,
) -> Result<Option<String>> {
    match key {
        ModelRequirementKey::ModelVariant => {
            let variant = ModelVariant::from_keyword(value).ok_or_else(|| {
                ParseError::invalid(NAME, format!("Unknown model variant {value:?}"))
            })?;
            match requirements.model_variant {
                Some(existing) if existing != variant => Ok(Some(existing.as_title().to_string())),
                Some(_) => Ok(None),
                None => {
                    requirements.model_variant = Some(variant);
                    Ok(None)
                }
            }
        }
        ModelRequirementKey::ModelName => match &requirements.model_name {
            Some(existing) if existing != value => Ok(Some(existing.clone())),
            Some(_) => Ok(None),
            None => {
                requirements.model_name = Some(value.to_string());
                Ok(None)
            }
        },
    }
}

fn apply_to_pipeline(command: &Command, pipeline: &mut PipelineJson) -> Result<()> {
    let Command::Model { key, value } = command else {
        return Err(wrong_command(NAME, command));
    };

    let requirements = pipeline
        .default_model_requirements
        .get_or_insert_with(ModelRequirements::default);

    if let Some(existing) = set_requirement(requirements, *key, value)? {
        log::debug!(
            "Ignoring MODEL {} {value}, pipeline default is already {existing}",
            key.as_keyword()
        );
    }

    Ok(())
}

fn apply_to_template(
    command: &Command,
    template: &mut PromptTemplateJson,
    _pipeline: &mut PipelineJson,
) -> Result<()> {
    let Command::Model { key, value } = command else {
        return Err(wrong_command(NAME, command));
    };

    let requirements = template
        .model_requirements
        .get_or_insert_with(ModelRequirements::default);

    match set_requirement(requirements, *key, value)? {
        Some(existing) => Err(ParseError::conflict(
            NAME,
            format!(
                "template {:?} already requires {} {existing}, can not also require {value}",
                template.title,
                key.as_keyword()
            ),
        )),
        None => Ok(()),
    }
}

fn take_requirements(requirements: Option<&ModelRequirements>) -> Vec<Command> {
    let Some(requirements) = requirements else {
        return Vec::new();
    };

    let mut commands = Vec::new();
    if let Some(variant) = requirements.model_variant {
        commands.push(Command::Model {
            key: ModelRequirementKey::ModelVariant,
            value: variant.as_str().to_string(),
        });
    }
    if let Some(model_name) = &requirements.model_name {
        commands.push(Command::Model {
            key: ModelRequirementKey::ModelName,
            value: model_name.clone(),
        });
    }
    commands
}

fn take_from_pipeline(pipeline: &PipelineJson) -> Vec<Command> {
    take_requirements(pipeline.default_model_requirements.as_ref())
}

fn take_from_template(template: &PromptTemplateJson, _pipeline: &PipelineJson) -> Vec<Command> {
    take_requirements(template.model_requirements.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_command;

    #[test]
    fn test_parse_model_variant() {
        let command = parse_command("MODEL VARIANT chat", CommandUsagePlace::PipelineTemplate).unwrap();
        assert_eq!(
            command,
            Command::Model {
                key: ModelRequirementKey::ModelVariant,
                value: "CHAT".to_string()
            }
        );
        assert_eq!(stringify(&command).unwrap(), "MODEL VARIANT Chat");
    }

    #[test]
    fn test_parse_model_name() {
        let command = parse_command(
            "MODEL NAME `gpt-3.5-turbo-instruct`",
            CommandUsagePlace::PipelineHead,
        )
        .unwrap();
        assert_eq!(
            command,
            Command::Model {
                key: ModelRequirementKey::ModelName,
                value: "gpt-3.5-turbo-instruct".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_model_commands() {
        let err = parse_command("MODEL VARIANT Poem", CommandUsagePlace::PipelineHead).unwrap_err();
        assert!(err.to_string().contains("Unknown model variant"));

        let err = parse_command("MODEL COLOR blue", CommandUsagePlace::PipelineHead).unwrap_err();
        assert!(err.to_string().contains("Unknown model key"));

        let err = parse_command("MODEL NAME a b", CommandUsagePlace::PipelineHead).unwrap_err();
        assert!(err.to_string().contains("exactly one model name"));
    }

    #[test]
    fn test_head_model_first_wins() {
        let mut pipeline = PipelineJson::new("Test");
        for name in ["gpt-4", "gpt-3.5-turbo"] {
            let command = Command::Model {
                key: ModelRequirementKey::ModelName,
                value: name.to_string(),
            };
            apply_to_pipeline(&command, &mut pipeline).unwrap();
        }
        let defaults = pipeline.default_model_requirements.as_ref().unwrap();
        assert_eq!(defaults.model_name.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn test_template_model_conflict() {
        let mut pipeline = PipelineJson::new("Test");
        let mut template = PromptTemplateJson::new("Step", "", "result");
        let chat = Command::Model {
            key: ModelRequirementKey::ModelVariant,
            value: "CHAT".to_string(),
        };
        let completion = Command::Model {
            key: ModelRequirementKey::ModelVariant,
            value: "COMPLETION".to_string(),
        };

        apply_to_template(&chat, &mut template, &mut pipeline).unwrap();
        let err = apply_to_template(&completion, &mut template, &mut pipeline).unwrap_err();
        assert!(matches!(err, ParseError::Conflict { .. }));
        assert_eq!(take_from_template(&template, &pipeline), vec![chat]);
    }
}
