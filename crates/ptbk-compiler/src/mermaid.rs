//! Mermaid flowchart of a pipeline
//!
//! Renders the template graph from the input node through the templates to
//! the output node, labelling every edge with the parameter it carries.

use crate::error::Result;
use crate::validator::{ValidationError, Violation};
use ptbk_core::{normalize_to_camel_case, title_to_name, PipelineJson, PromptTemplateJson};

const TIP: &str =
    "%% 🔮 Tip: Open this on GitHub or in the VSCode website to see the Mermaid graph visually";

/// Target of a clickable template node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MermaidLink {
    pub href: String,
    pub title: String,
}

/// Callback choosing the link of each template node
pub type LinkTemplate<'a> = &'a dyn Fn(&PromptTemplateJson) -> Option<MermaidLink>;

/// Render a pipeline as a mermaid flowchart
pub fn render_pipeline_mermaid(
    pipeline: &PipelineJson,
    link_template: Option<LinkTemplate<'_>>,
) -> Result<String> {
    let mut body: Vec<String> = vec!["input((Input)):::input".to_string()];

    for template in &pipeline.prompt_templates {
        let node = template_node(template);
        body.push(format!("{node}(\"{}\")", escape(&template.title)));

        for parameter in &template.dependent_parameter_names {
            let from = source_node(pipeline, parameter).ok_or_else(|| ValidationError {
                violations: vec![Violation::UndefinedParameter {
                    template: template.title.clone(),
                    parameter: parameter.clone(),
                }],
            })?;
            body.push(format!("{from}--\"{{{parameter}}}\"-->{node}"));
        }
    }

    body.push(String::new());
    for parameter in pipeline.parameters.iter().filter(|p| p.is_output) {
        let from = pipeline
            .producer_of(&parameter.name)
            .map(template_node)
            .ok_or_else(|| ValidationError {
                violations: vec![Violation::OutputWithoutProducer {
                    parameter: parameter.name.clone(),
                }],
            })?;
        body.push(format!("{from}--\"{{{}}}\"-->output", parameter.name));
    }
    body.push("output((Output)):::output".to_string());

    if let Some(link_template) = link_template {
        let clicks: Vec<String> = pipeline
            .prompt_templates
            .iter()
            .filter_map(|template| {
                link_template(template).map(|link| {
                    format!(
                        "click {} href \"{}\" \"{}\";",
                        template_node(template),
                        escape(&link.href),
                        escape(&link.title)
                    )
                })
            })
            .collect();
        if !clicks.is_empty() {
            body.push(String::new());
            body.extend(clicks);
        }
    }

    body.push(String::new());
    body.push("classDef input color: grey;".to_string());
    body.push("classDef output color: grey;".to_string());

    let mut lines = vec![
        TIP.to_string(),
        String::new(),
        "flowchart LR".to_string(),
        format!("  subgraph \"{}\"", escape(&pipeline.title)),
        String::new(),
        "      direction TB".to_string(),
        String::new(),
    ];
    lines.extend(body.into_iter().map(|line| {
        if line.is_empty() {
            line
        } else {
            format!("      {line}")
        }
    }));
    lines.push(String::new());
    lines.push("  end;".to_string());

    Ok(lines.join("\n") + "\n")
}

fn template_node(template: &PromptTemplateJson) -> String {
    normalize_to_camel_case(&format!("template-{}", title_to_name(&template.title)))
}

/// Node a parameter flows out of: the input node or its producing template
fn source_node(pipeline: &PipelineJson, parameter: &str) -> Option<String> {
    if pipeline.parameter(parameter).is_some_and(|p| p.is_input) {
        return Some("input".to_string());
    }
    pipeline.producer_of(parameter).map(template_node)
}

fn escape(text: &str) -> String {
    text.replace('"', "#quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptbk_core::ParameterJson;

    fn sample() -> PipelineJson {
        PipelineJson::new("Sample")
            .with_parameter(ParameterJson::input("thing"))
            .with_parameter(ParameterJson::new("draft"))
            .with_parameter(ParameterJson::output("response"))
            .with_template(
                PromptTemplateJson::new("Write draft", "{thing}", "draft").with_dependent("thing"),
            )
            .with_template(
                PromptTemplateJson::new("Polish", "{draft}", "response").with_dependent("draft"),
            )
    }

    #[test]
    fn test_graph_edges() {
        let mermaid = render_pipeline_mermaid(&sample(), None).unwrap();

        assert!(mermaid.starts_with(TIP));
        assert!(mermaid.contains("flowchart LR"));
        assert!(mermaid.contains("subgraph \"Sample\""));
        assert!(mermaid.contains("templateWriteDraft(\"Write draft\")"));
        assert!(mermaid.contains("input--\"{thing}\"-->templateWriteDraft"));
        assert!(mermaid.contains("templateWriteDraft--\"{draft}\"-->templatePolish"));
        assert!(mermaid.contains("templatePolish--\"{response}\"-->output"));
        assert!(!mermaid.contains("click"));
        assert!(mermaid.trim_end().ends_with("end;"));
    }

    #[test]
    fn test_links() {
        let link: LinkTemplate<'_> = &|template| {
            Some(MermaidLink {
                href: format!("#{}", template.name),
                title: template.title.clone(),
            })
        };
        let mermaid = render_pipeline_mermaid(&sample(), Some(link)).unwrap();
        assert!(mermaid.contains("click templatePolish href \"#polish\" \"Polish\";"));
    }

    #[test]
    fn test_unresolved_parameter_is_an_error() {
        let pipeline = PipelineJson::new("Broken").with_template(
            PromptTemplateJson::new("A", "{missing}", "out").with_dependent("missing"),
        );
        let err = render_pipeline_mermaid(&pipeline, None).unwrap_err();
        assert!(err.to_string().contains("{missing}"));
    }
}
