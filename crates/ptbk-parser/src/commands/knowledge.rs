//! KNOWLEDGE command
//!
//! The source can be a https URL, a relative path or inline text. Sources
//! are named from their content so the same source written twice is the
//! same knowledge source.

use super::{wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{
    title_to_name, Command, CommandType, CommandUsagePlace, KnowledgeSourceJson, PipelineJson,
    PromptTemplateJson,
};

const NAME: &str = "KNOWLEDGE";

/// Longest name derived from a source, without the `source-` prefix
const MAX_NAME_LENGTH: usize = 48;

pub(crate) const KNOWLEDGE_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &[],
    usage_places: &[CommandUsagePlace::PipelineHead, CommandUsagePlace::PipelineTemplate],
    description: "Knowledge the templates can draw from: URL, file path or inline text",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "KNOWLEDGE https://www.pavolhejny.com/",
        "KNOWLEDGE ./hejny-cv.md",
        "KNOWLEDGE Pavol Hejný is a web developer and creator of promptbook",
    ],
    produces: &[CommandType::Knowledge],
    parse,
    stringify,
    apply_to_pipeline: Some(apply_to_pipeline),
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: Some(take_from_pipeline),
    take_from_template: Some(take_from_template),
};

/// Name under which a knowledge source is registered
pub fn knowledge_source_name(source_content: &str) -> String {
    let mut name = title_to_name(source_content);
    if name.len() > MAX_NAME_LENGTH {
        let mut end = MAX_NAME_LENGTH;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
        while name.ends_with('-') {
            name.pop();
        }
    }
    format!("source-{name}")
}

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    let source_content = match input.args.as_slice() {
        [] => return Err(ParseError::invalid(NAME, "requires a source")),
        [single] => single.as_str(),
        _ => input.raw_args_from(0),
    };

    if source_content.starts_with("http://") {
        return Err(ParseError::invalid(
            NAME,
            format!("source URL must use https, got {source_content:?}"),
        ));
    }

    if source_content.starts_with("https://") {
        ::url::Url::parse(source_content).map_err(|e| {
            ParseError::invalid(NAME, format!("Invalid URL {source_content:?}: {e}"))
        })?;
    }

    Ok(Command::Knowledge {
        source_content: source_content.to_string(),
    })
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::Knowledge { source_content } => Ok(format!("KNOWLEDGE {source_content}")),
        other => Err(wrong_command(NAME, other)),
    }
}

fn register(command: &Command, pipeline: &mut PipelineJson) -> Result<String> {
    let Command::Knowledge { source_content } = command else {
        return Err(wrong_command(NAME, command));
    };

    let name = knowledge_source_name(source_content);

    match pipeline.knowledge_source(&name) {
        Some(existing) if existing.source_content != *source_content => {
            return Err(ParseError::conflict(
                NAME,
                format!(
                    "sources {:?} and {source_content:?} both resolve to the name {name}",
                    existing.source_content
                ),
            ));
        }
        Some(_) => {}
        None => pipeline
            .knowledge_sources
            .push(KnowledgeSourceJson::new(name.clone(), source_content.clone())),
    }

    Ok(name)
}

fn apply_to_pipeline(command: &Command, pipeline: &mut PipelineJson) -> Result<()> {
    register(command, pipeline).map(|_| ())
}

fn apply_to_template(
    command: &Command,
    template: &mut PromptTemplateJson,
    pipeline: &mut PipelineJson,
) -> Result<()> {
    let name = register(command, pipeline)?;
    if !template.knowledge_source_names.contains(&name) {
        template.knowledge_source_names.push(name);
    }
    Ok(())
}

fn take_from_pipeline(pipeline: &PipelineJson) -> Vec<Command> {
    pipeline
        .knowledge_sources
        .iter()
        .map(|source| Command::Knowledge {
            source_content: source.source_content.clone(),
        })
        .collect()
}

fn take_from_template(template: &PromptTemplateJson, pipeline: &PipelineJson) -> Vec<Command> {
    template
        .knowledge_source_names
        .iter()
        .filter_map(|name| pipeline.knowledge_source(name))
        .map(|source| Command::Knowledge {
            source_content: source.source_content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_command;

    fn knowledge(source: &str) -> Command {
        Command::Knowledge {
            source_content: source.to_string(),
        }
    }

    #[test]
    fn test_parse_sources() {
        let command =
            parse_command("KNOWLEDGE https://example.com/doc.pdf", CommandUsagePlace::PipelineHead)
                .unwrap();
        assert_eq!(command, knowledge("https://example.com/doc.pdf"));

        let command = parse_command(
            "KNOWLEDGE Jane is  a lawyer",
            CommandUsagePlace::PipelineTemplate,
        )
        .unwrap();
        assert_eq!(command, knowledge("Jane is  a lawyer"));
    }

    #[test]
    fn test_plain_http_is_rejected() {
        let err = parse_command("KNOWLEDGE http://example.com/", CommandUsagePlace::PipelineHead)
            .unwrap_err();
        assert!(err.to_string().contains("https"));

        let err = parse_command("KNOWLEDGE", CommandUsagePlace::PipelineHead).unwrap_err();
        assert!(err.to_string().contains("requires a source"));
    }

    #[test]
    fn test_source_names() {
        assert_eq!(
            knowledge_source_name("https://example.com/doc.pdf"),
            "source-https-example-com-doc-pdf"
        );
        let long = "word ".repeat(40);
        let name = knowledge_source_name(&long);
        assert!(name.len() <= "source-".len() + MAX_NAME_LENGTH);
        assert!(!name.ends_with('-'));
    }

    #[test]
    fn test_template_links_source_once() {
        let mut pipeline = PipelineJson::new("Test");
        let mut template = PromptTemplateJson::new("Step", "", "result");
        let source = knowledge("./cv.md");

        apply_to_pipeline(&source, &mut pipeline).unwrap();
        apply_to_template(&source, &mut template, &mut pipeline).unwrap();
        apply_to_template(&source, &mut template, &mut pipeline).unwrap();

        assert_eq!(pipeline.knowledge_sources.len(), 1);
        assert_eq!(template.knowledge_source_names, vec!["source-cv-md".to_string()]);
        assert_eq!(take_from_template(&template, &pipeline), vec![source]);
    }

    #[test]
    fn test_name_collision_is_a_conflict() {
        let mut pipeline = PipelineJson::new("Test");
        apply_to_pipeline(&knowledge("./cv.md"), &mut pipeline).unwrap();
        let err = apply_to_pipeline(&knowledge("cv md"), &mut pipeline).unwrap_err();
        assert!(matches!(err, ParseError::Conflict { .. }));
    }
}
