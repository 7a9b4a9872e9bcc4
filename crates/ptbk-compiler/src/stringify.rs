//! Stringify: write a compiled pipeline back as markdown
//!
//! Every command parser recovers its commands from the pipeline (head) or a
//! template, in catalog order, so compiling the output yields the same
//! pipeline again.

use crate::error::Result;
use ptbk_core::{PipelineJson, PromptTemplateJson};
use ptbk_parser::CommandRegistry;

/// Write a pipeline as a markdown document
pub fn stringify_pipeline(pipeline: &PipelineJson) -> Result<String> {
    stringify_pipeline_with(CommandRegistry::builtin(), pipeline)
}

/// Write a pipeline using a specific command registry
pub fn stringify_pipeline_with(registry: &CommandRegistry, pipeline: &PipelineJson) -> Result<String> {
    let mut blocks: Vec<String> = Vec::new();

    if !pipeline.title.is_empty() {
        blocks.push(format!("# {}", escape_heading(&pipeline.title)));
    }
    push_description(&mut blocks, pipeline.description.as_deref());

    let mut head = Vec::new();
    for parser in registry.parsers() {
        if let Some(take) = parser.take_from_pipeline {
            for command in take(pipeline) {
                head.push(registry.stringify(&command)?);
            }
        }
    }
    push_command_list(&mut blocks, &head);

    for template in &pipeline.prompt_templates {
        stringify_template(registry, template, pipeline, &mut blocks)?;
    }

    let mut markdown = blocks.join("\n\n");
    markdown.push('\n');
    Ok(markdown)
}

fn stringify_template(
    registry: &CommandRegistry,
    template: &PromptTemplateJson,
    pipeline: &PipelineJson,
    blocks: &mut Vec<String>,
) -> Result<()> {
    blocks.push(format!("## {}", escape_heading(&template.title)));
    push_description(blocks, template.description.as_deref());

    let mut commands = Vec::new();
    for parser in registry.parsers() {
        if let Some(take) = parser.take_from_template {
            for command in take(template, pipeline) {
                commands.push(registry.stringify(&command)?);
            }
        }
    }
    push_command_list(blocks, &commands);

    let fence = fence_for(&template.content);
    blocks.push(format!(
        "{fence}{}\n{}\n{fence}",
        template.content_language.as_deref().unwrap_or_default(),
        template.content
    ));

    blocks.push(format!("-> {{{}}}", template.resulting_parameter_name));
    Ok(())
}

fn push_description(blocks: &mut Vec<String>, description: Option<&str>) {
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        let escaped = description
            .lines()
            .map(escape_line_start)
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(escaped);
    }
}

/// Escape whatever would open a block other than a paragraph
///
/// Descriptions hold unescaped prose, so `1986. A good year.` has to be
/// written as `1986\. A good year.` to stay out of an ordered list.
fn escape_line_start(line: &str) -> String {
    let line = line.trim_start();

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && matches!(line[digits..].chars().next(), Some('.' | ')')) {
        return format!("{}\\{}", &line[..digits], &line[digits..]);
    }

    match line.chars().next() {
        Some('`') => {
            let ticks = line.chars().take_while(|c| *c == '`').count();
            format!("{}{}", "\\`".repeat(ticks), &line[ticks..])
        }
        Some('#' | '>' | '<' | '-' | '+' | '*' | '_' | '=' | '~') => format!("\\{line}"),
        _ => line.to_string(),
    }
}

/// Keep a trailing `#` run from being read as a closing sequence
fn escape_heading(title: &str) -> String {
    let trimmed = title.trim_end_matches('#');
    if trimmed.len() == title.len() {
        return title.to_string();
    }
    format!("{trimmed}\\{}", &title[trimmed.len()..])
}

fn push_command_list(blocks: &mut Vec<String>, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let list = lines
        .iter()
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    blocks.push(list);
}

/// A backtick fence longer than any backtick run inside the content
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in content.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}
