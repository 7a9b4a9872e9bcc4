//! Unit tests for the compiler, validator and stringifier
//!
//! Covers the compile scenarios, first-wins head commands, cycle reporting,
//! idempotent stringify, collections loaded from disk and the output helpers.

use ptbk_compiler::*;
use ptbk_core::{ExecutionType, ExpectationUnit, ModelVariant, PipelineJson};
use std::fs;

const MINIMAL: &str = r#"# Sample prompt

- INPUT PARAMETER {thing}

## Prompt

```
I bought {thing}.
```

-> {response}
"#;

const FULL: &str = r#"# ✨ Sample pipeline

Shows the commands a pipeline head and its templates can carry.

- PROMPTBOOK URL https://promptbook.example.com/samples/full.ptbk.md
- PROMPTBOOK VERSION 1.0.0
- MODEL VARIANT Chat
- PERSONA Jane, customer support specialist
- KNOWLEDGE https://promptbook.example.com/faq.md
- INPUT PARAMETER {question} The customer question
- OUTPUT PARAMETER {answer} Final answer

## 💬 Draft answer

Write the first version.

- MODEL NAME `gpt-4`
- PERSONA Jane
- KNOWLEDGE https://promptbook.example.com/faq.md
- EXPECT MIN 1 SENTENCE
- EXPECT MAX 3 PARAGRAPHS

```text
Answer the question: {question}
```

-> {draft}

## 🔧 Polish

- EXECUTE SCRIPT
- POSTPROCESS trim

```javascript
return "{draft}".trim();
```

-> {answer}
"#;

const LIBRARY_SAMPLE: &str = r#"# ✨ Sample prompt with URL

- PROMPTBOOK URL https://promptbook.example.com/samples/simple.ptbk.md@v1
- PROMPTBOOK VERSION 1.0.0
- MODEL VARIANT Chat
- MODEL NAME gpt-3.5-turbo
- OUTPUT PARAMETER `{greeting}`

## 💬 Prompt

```text
Hello
```

-> {greeting}
"#;

// =============================================================================
// Compile Scenarios
// =============================================================================

#[test]
fn test_minimal_pipeline() {
    let pipeline = compile_pipeline(MINIMAL).unwrap();

    assert_eq!(pipeline.title, "Sample prompt");

    let parameters: Vec<(&str, bool, bool)> = pipeline
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.is_input, p.is_output))
        .collect();
    assert_eq!(
        parameters,
        vec![("thing", true, false), ("response", false, true)]
    );

    assert_eq!(pipeline.prompt_templates.len(), 1);
    let template = &pipeline.prompt_templates[0];
    assert!(template.dependent_parameter_names.contains("thing"));
    assert_eq!(template.resulting_parameter_name, "response");
    assert_eq!(template.content, "I bought {thing}.");
    assert_eq!(template.execution_type, ExecutionType::PromptTemplate);
}

#[test]
fn test_full_pipeline_fields() {
    let pipeline = compile_pipeline(FULL).unwrap();

    assert_eq!(pipeline.title, "✨ Sample pipeline");
    assert_eq!(
        pipeline.pipeline_url.as_deref(),
        Some("https://promptbook.example.com/samples/full.ptbk.md")
    );
    assert_eq!(pipeline.promptbook_version.as_deref(), Some("1.0.0"));
    assert!(pipeline.description.as_deref().unwrap().starts_with("Shows the commands"));

    let defaults = pipeline.default_model_requirements.as_ref().unwrap();
    assert_eq!(defaults.model_variant, Some(ModelVariant::Chat));

    assert_eq!(pipeline.personas.len(), 1);
    assert_eq!(pipeline.personas[0].description, "customer support specialist");
    assert_eq!(pipeline.knowledge_sources.len(), 1);

    let draft = &pipeline.prompt_templates[0];
    assert_eq!(draft.description.as_deref(), Some("Write the first version."));
    assert_eq!(draft.persona_name.as_deref(), Some("Jane"));
    assert_eq!(draft.knowledge_source_names.len(), 1);
    assert_eq!(draft.content_language.as_deref(), Some("text"));
    let sentences = &draft.expectations[&ExpectationUnit::Sentences];
    assert_eq!(sentences.min, Some(1));
    assert_eq!(draft.expectations[&ExpectationUnit::Paragraphs].max, Some(3));
    assert_eq!(
        draft.model_requirements.as_ref().unwrap().model_name.as_deref(),
        Some("gpt-4")
    );

    let polish = &pipeline.prompt_templates[1];
    assert_eq!(polish.execution_type, ExecutionType::Script);
    assert_eq!(polish.postprocessing_function_names, vec!["trim".to_string()]);
    assert!(polish.dependent_parameter_names.contains("draft"));

    let draft_parameter = pipeline.parameter("draft").unwrap();
    assert!(!draft_parameter.is_input && !draft_parameter.is_output);
}

#[test]
fn test_missing_parameter_is_named() {
    let markdown = "# T\n\n## Prompt\n\n```\nUse {missing}\n```\n\n-> {out}\n";

    let err = compile_pipeline(markdown).unwrap_err();
    let CompileError::Validation(validation) = &err else {
        panic!("expected a validation error, got {err}");
    };
    assert!(validation.mentions_parameter("missing"));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_validation_can_be_skipped() {
    let markdown = "# T\n\n## Prompt\n\n```\nUse {missing}\n```\n\n-> {out}\n";
    let options = CompilerOptions {
        validate: false,
        ..CompilerOptions::default()
    };

    let pipeline = PipelineCompiler::with_options(options).compile(markdown).unwrap();
    assert_eq!(collect_violations(&pipeline).len(), 1);
}

#[test]
fn test_first_version_wins() {
    let markdown = "# T\n\n- PROMPTBOOK VERSION 1.0.0\n- PROMPTBOOK VERSION 2.0.0\n";
    let pipeline = compile_pipeline(markdown).unwrap();
    assert_eq!(pipeline.promptbook_version.as_deref(), Some("1.0.0"));
}

#[test]
fn test_template_only_command_in_head_is_an_error() {
    let err = compile_pipeline("# T\n\n- EXPECT MIN 2 LINES\n").unwrap_err();
    assert!(matches!(err, CompileError::Command { .. }));
    let message = err.to_string();
    assert!(message.contains("line 3"), "{message}");
    assert!(message.contains("PIPELINE_HEAD"), "{message}");
}

#[test]
fn test_cycle_is_reported_with_parameter_names() {
    let markdown = r#"# Cycle

## A

```
{b}
```

-> {a}

## B

```
{a}
```

-> {b}
"#;

    let err = compile_pipeline(markdown).unwrap_err();
    let CompileError::Validation(validation) = err else {
        panic!("expected a validation error");
    };

    let cycle = validation
        .violations
        .iter()
        .find_map(|violation| match violation {
            Violation::Cycle { parameters } => Some(parameters.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(cycle.first(), cycle.last());
    assert!(cycle.contains(&"a".to_string()));
    assert!(cycle.contains(&"b".to_string()));
}

#[test]
fn test_head_code_block_option() {
    let markdown = "# T\n\n```\nstray\n```\n\n## P\n\n```\nx\n```\n\n-> {y}\n";

    assert!(compile_pipeline(markdown).is_ok());

    let options = CompilerOptions::from_yaml("allow_head_code_blocks: false").unwrap();
    let err = PipelineCompiler::with_options(options).compile(markdown).unwrap_err();
    assert!(matches!(err, CompileError::HeadCodeBlock { .. }));
}

#[test]
fn test_foreach_is_not_implemented() {
    let markdown = r#"# Loop

- INPUT PARAMETER {customers}

## Greet

- FOREACH List Line -> {customer}

```
Hello {customer}
```

-> {greetings}
"#;

    let err = compile_pipeline(markdown).unwrap_err();
    assert!(err.is_not_implemented(), "{err}");
}

// =============================================================================
// Closure
// =============================================================================

#[test]
fn test_dependents_are_declared_parameters() {
    for source in [MINIMAL, FULL, LIBRARY_SAMPLE] {
        let pipeline = compile_pipeline(source).unwrap();
        for template in &pipeline.prompt_templates {
            for name in &template.dependent_parameter_names {
                assert!(pipeline.parameter(name).is_some(), "{name} is not declared");
            }
        }
    }
}

// =============================================================================
// Stringify
// =============================================================================

#[test]
fn test_compile_is_idempotent_through_stringify() {
    for source in [MINIMAL, FULL, LIBRARY_SAMPLE] {
        let compiled = compile_pipeline(source).unwrap();
        let markdown = stringify_pipeline(&compiled).unwrap();

        let recompiled = compile_pipeline(&markdown).unwrap();
        assert_eq!(recompiled, compiled, "{markdown}");
        assert_eq!(stringify_pipeline(&recompiled).unwrap(), markdown);
    }
}

#[test]
fn test_snake_case_references_match_declarations() {
    let markdown = r#"# Greeting

- INPUT PARAMETER {first_name}

## Greet

```
Hello {first_name}
```

-> {greeting}
"#;
    let pipeline = compile_pipeline(markdown).unwrap();
    assert!(pipeline.parameter("firstName").unwrap().is_input);
    assert!(pipeline.parameter("greeting").unwrap().is_output);

    let template = &pipeline.prompt_templates[0];
    assert_eq!(template.content, "Hello {first_name}");
    assert!(template.dependent_parameter_names.contains("firstName"));
    assert!(!template.dependent_parameter_names.contains("first_name"));

    let markdown = stringify_pipeline(&pipeline).unwrap();
    assert_eq!(compile_pipeline(&markdown).unwrap(), pipeline);
}

#[test]
fn test_snake_case_result_feeds_next_template() {
    let markdown = r#"# Chain

- INPUT PARAMETER {first_name}

## First

```
Summarize {first_name}
```

-> {my_result}

## Second

```
Use {my_result}
```

-> {final_answer}
"#;
    let pipeline = compile_pipeline(markdown).unwrap();
    assert!(pipeline.prompt_templates[1].dependent_parameter_names.contains("myResult"));
    assert!(!pipeline.parameter("myResult").unwrap().is_output);
    assert!(pipeline.parameter("finalAnswer").unwrap().is_output);
}

#[test]
fn test_escaped_prose_is_idempotent_through_stringify() {
    let source = r#"# Yearbook

1986\. A good year.

- INPUT PARAMETER {thing}

## Prompt

\- not a command

\-> not the result

```
{thing}
```

-> {response}
"#;
    let compiled = compile_pipeline(source).unwrap();
    assert_eq!(compiled.description.as_deref(), Some("1986. A good year."));
    assert_eq!(
        compiled.prompt_templates[0].description.as_deref(),
        Some("- not a command\n\n-> not the result")
    );

    let markdown = stringify_pipeline(&compiled).unwrap();
    assert!(markdown.contains("1986\\. A good year."), "{markdown}");

    let recompiled = compile_pipeline(&markdown).unwrap();
    assert_eq!(recompiled, compiled, "{markdown}");
    assert_eq!(stringify_pipeline(&recompiled).unwrap(), markdown);
}

#[test]
fn test_stringify_of_json_round_trip() -> anyhow::Result<()> {
    let compiled = compile_pipeline(FULL)?;
    let restored = PipelineJson::from_json(&compiled.to_json()?)?;

    assert_eq!(restored, compiled);
    assert_eq!(stringify_pipeline(&restored)?, stringify_pipeline(&compiled)?);
    Ok(())
}

// =============================================================================
// Output Helpers
// =============================================================================

#[test]
fn test_mermaid_of_compiled_pipeline() {
    let pipeline = compile_pipeline(FULL).unwrap();
    let mermaid = render_pipeline_mermaid(&pipeline, None).unwrap();

    assert!(mermaid.contains("input--\"{question}\"-->templateDraftAnswer"));
    assert!(mermaid.contains("templateDraftAnswer--\"{draft}\"-->templatePolish"));
    assert!(mermaid.contains("templatePolish--\"{answer}\"-->output"));
}

#[test]
fn test_compiled_pipeline_is_not_prepared() {
    let pipeline = compile_pipeline(FULL).unwrap();
    assert!(!is_pipeline_prepared(&pipeline));
    assert_eq!(unprepare_pipeline(&pipeline), pipeline);
}

// =============================================================================
// Collection
// =============================================================================

#[test]
fn test_collection_from_library_sample() {
    let collection =
        PipelineCollection::from_sources(&[LIBRARY_SAMPLE], &CompilerOptions::default()).unwrap();

    let pipeline = collection
        .get_by_url("https://promptbook.example.com/samples/simple.ptbk.md@v1")
        .unwrap();
    assert_eq!(pipeline.title, "✨ Sample prompt with URL");
    assert_eq!(pipeline.prompt_templates[0].content, "Hello");
    assert!(pipeline.parameter("greeting").unwrap().is_output);
}

#[test]
fn test_collection_from_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let nested = dir.path().join("nested");
    fs::create_dir(&nested)?;

    fs::write(dir.path().join("simple.ptbk.md"), LIBRARY_SAMPLE)?;
    fs::write(
        nested.join("full.ptbk.json"),
        compile_pipeline(FULL)?.to_json()?,
    )?;
    fs::write(dir.path().join("README.md"), "# Not a pipeline\n\n```\nx\n```\n")?;

    let collection = PipelineCollection::from_directory(dir.path(), &CompilerOptions::default())?;

    assert_eq!(
        collection.urls().collect::<Vec<_>>(),
        vec![
            "https://promptbook.example.com/samples/full.ptbk.md",
            "https://promptbook.example.com/samples/simple.ptbk.md@v1",
        ]
    );
    Ok(())
}

#[test]
fn test_collection_rejects_invalid_member() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut broken = compile_pipeline(LIBRARY_SAMPLE)?;
    broken.prompt_templates.clear();
    fs::write(dir.path().join("broken.ptbk.json"), broken.to_json()?)?;

    let err = PipelineCollection::from_directory(dir.path(), &CompilerOptions::default())
        .unwrap_err();
    assert!(matches!(err, CompileError::Validation(_)));
    Ok(())
}

#[test]
fn test_collection_of_missing_directory() {
    let err = PipelineCollection::from_directory(
        "/nonexistent/promptbook/library",
        &CompilerOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Io { .. }));
}
