//! Pipeline compiler
//!
//! Folds an extracted markdown document into a `PipelineJson` in three
//! phases: head commands, one pass per template section, then linking
//! (implicit parameters and validation).

use crate::error::{CompileError, Result};
use crate::validator::validate_pipeline;
use ptbk_core::{
    extract_parameter_names, is_reserved_parameter_name, normalize_to_camel_case,
    validate_parameter_name, CommandUsagePlace, ParameterJson, PipelineJson, PromptTemplateJson,
};
use ptbk_parser::{
    extract_pipeline, parse_command_with, CommandRegistry, ExtractedSection,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Compiler options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Run the validator and fail on violations
    pub validate: bool,
    /// Ignore code blocks in the pipeline head instead of rejecting them
    pub allow_head_code_blocks: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            validate: true,
            allow_head_code_blocks: true,
        }
    }
}

impl CompilerOptions {
    /// Load options from a YAML document; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| CompileError::Options(e.to_string()))
    }
}

/// The pipeline compiler
#[derive(Debug, Clone)]
pub struct PipelineCompiler {
    options: CompilerOptions,
    registry: &'static CommandRegistry,
}

impl Default for PipelineCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineCompiler {
    /// Create a compiler with default options
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    /// Create a compiler with custom options
    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            registry: CommandRegistry::builtin(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile a markdown pipeline document
    pub fn compile(&self, markdown: &str) -> Result<PipelineJson> {
        let extracted = extract_pipeline(markdown)?;

        let mut pipeline = PipelineJson::new(extracted.title.unwrap_or_default());
        pipeline.description = extracted.head.description.clone();

        log::trace!("compiling head of {:?}", pipeline.title);
        self.compile_head(&extracted.head, &mut pipeline)?;

        let mut implicit = Vec::new();
        for section in &extracted.templates {
            log::trace!("compiling template {:?}", section.title);
            let template = self.compile_template(section, &mut pipeline)?;

            if pipeline.parameter(&template.resulting_parameter_name).is_none() {
                implicit.push(template.resulting_parameter_name.clone());
                pipeline
                    .parameters
                    .push(ParameterJson::new(template.resulting_parameter_name.clone()));
            }
            pipeline.prompt_templates.push(template);
        }

        log::trace!("linking {} templates", pipeline.prompt_templates.len());
        mark_implicit_outputs(&mut pipeline, &implicit);

        if self.options.validate {
            validate_pipeline(&pipeline)?;
        }

        Ok(pipeline)
    }

    fn compile_head(&self, head: &ExtractedSection, pipeline: &mut PipelineJson) -> Result<()> {
        if let Some(block) = head.code_blocks.first() {
            if !self.options.allow_head_code_blocks {
                return Err(CompileError::HeadCodeBlock { line: block.line });
            }
            log::debug!("ignoring code block at line {} in pipeline head", block.line);
        }

        for line in &head.command_lines {
            let command =
                parse_command_with(self.registry, &line.text, CommandUsagePlace::PipelineHead)
                    .map_err(|e| CompileError::command("Pipeline head", line.line, e))?;

            self.registry
                .apply_to_pipeline(&command, pipeline)
                .map_err(|e| CompileError::command("Pipeline head", line.line, e))?;
        }

        Ok(())
    }

    fn compile_template(
        &self,
        section: &ExtractedSection,
        pipeline: &mut PipelineJson,
    ) -> Result<PromptTemplateJson> {
        let block = match section.code_blocks.as_slice() {
            [block] => block,
            _ => {
                return Err(template_error(section, "template must contain exactly one code block"));
            }
        };

        let Some(raw_result) = &section.result_parameter else {
            return Err(template_error(
                section,
                "template must declare its resulting parameter with `-> {parameterName}`",
            ));
        };
        let result = validate_parameter_name(raw_result)
            .map_err(|e| template_error(section, e.to_string()))?;

        let mut template = PromptTemplateJson::new(section.title.clone(), block.content.clone(), result);
        template.description = section.description.clone();
        template.content_language = block.language.clone();

        let context = format!("Template {:?}", section.title);
        for line in &section.command_lines {
            let command =
                parse_command_with(self.registry, &line.text, CommandUsagePlace::PipelineTemplate)
                    .map_err(|e| CompileError::command(&context, line.line, e))?;

            self.registry
                .apply_to_template(&command, &mut template, pipeline)
                .map_err(|e| CompileError::command(&context, line.line, e))?;
        }

        template.dependent_parameter_names = dependent_parameter_names(&template);

        Ok(template)
    }
}

/// Compile a markdown pipeline document with default options
pub fn compile_pipeline(markdown: &str) -> Result<PipelineJson> {
    PipelineCompiler::new().compile(markdown)
}

fn template_error(section: &ExtractedSection, message: impl Into<String>) -> CompileError {
    CompileError::Template {
        template: section.title.clone(),
        line: section.line,
        message: message.into(),
    }
}

/// Parameters referenced by the body plus the jokers; reserved names are filled by the executor
///
/// References are written as the author typed them (`{first_name}`) and
/// compared in canonical form (`firstName`), like the declarations.
fn dependent_parameter_names(template: &PromptTemplateJson) -> BTreeSet<String> {
    extract_parameter_names(&template.content)
        .iter()
        .map(|name| normalize_to_camel_case(name))
        .chain(template.joker_parameter_names.iter().cloned())
        .filter(|name| !is_reserved_parameter_name(name))
        .collect()
}

/// Undeclared results that no template consumes are the pipeline's outputs
fn mark_implicit_outputs(pipeline: &mut PipelineJson, implicit: &[String]) {
    let consumed: BTreeSet<&str> = pipeline
        .prompt_templates
        .iter()
        .flat_map(|t| t.dependent_parameter_names.iter().map(String::as_str))
        .collect();

    let outputs: Vec<String> = implicit
        .iter()
        .filter(|name| !consumed.contains(name.as_str()))
        .cloned()
        .collect();

    for parameter in &mut pipeline.parameters {
        if outputs.contains(&parameter.name) {
            parameter.is_output = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"# Sample

- INPUT PARAMETER {thing}

## Prompt

```
I bought {thing}.
```

-> {response}
"#;

    #[test]
    fn test_default_options() {
        let options = CompilerOptions::default();
        assert!(options.validate);
        assert!(options.allow_head_code_blocks);
    }

    #[test]
    fn test_options_from_yaml() {
        let options = CompilerOptions::from_yaml("allow_head_code_blocks: false\n").unwrap();
        assert!(options.validate);
        assert!(!options.allow_head_code_blocks);

        assert_eq!(CompilerOptions::from_yaml("").unwrap(), CompilerOptions::default());
        assert!(matches!(
            CompilerOptions::from_yaml("validate: [1, 2]"),
            Err(CompileError::Options(_))
        ));
    }

    #[test]
    fn test_implicit_result_becomes_output() {
        let pipeline = compile_pipeline(MINIMAL).unwrap();
        let response = pipeline.parameter("response").unwrap();
        assert!(response.is_output);
        assert!(!response.is_input);
    }

    #[test]
    fn test_consumed_implicit_result_is_intermediate() {
        let markdown = r#"# Chain

- INPUT PARAMETER {thing}

## First

```
{thing}
```

-> {middle}

## Second

```
{middle}
```

-> {last}
"#;
        let pipeline = compile_pipeline(markdown).unwrap();
        assert!(!pipeline.parameter("middle").unwrap().is_output);
        assert!(pipeline.parameter("last").unwrap().is_output);
    }

    #[test]
    fn test_reserved_references_are_not_dependencies() {
        let markdown = "# R\n\n## Prompt\n\n```\n{context} and {currentDate}\n```\n\n-> {answer}\n";
        let pipeline = compile_pipeline(markdown).unwrap();
        assert!(pipeline.prompt_templates[0].dependent_parameter_names.is_empty());
    }

    #[test]
    fn test_jokers_are_dependencies() {
        let markdown = r#"# J

- INPUT PARAMETER {title}
- INPUT PARAMETER {draft}

## Prompt

- JOKER {draft}

```
Write about {title}
```

-> {article}
"#;
        let pipeline = compile_pipeline(markdown).unwrap();
        let dependents = &pipeline.prompt_templates[0].dependent_parameter_names;
        assert!(dependents.contains("title"));
        assert!(dependents.contains("draft"));
    }

    #[test]
    fn test_missing_result_line() {
        let err = compile_pipeline("# T\n\n## Prompt\n\n```\nx\n```\n").unwrap_err();
        assert!(matches!(err, CompileError::Template { .. }));
        assert!(err.to_string().contains("resulting parameter"));
    }

    #[test]
    fn test_missing_code_block() {
        let err = compile_pipeline("# T\n\n## Prompt\n\n-> {x}\n").unwrap_err();
        assert!(err.to_string().contains("exactly one code block"));
    }
}
