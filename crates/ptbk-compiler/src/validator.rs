//! Pipeline validator
//!
//! Checks the invariants of a compiled pipeline and reports every violation
//! found in one pass:
//! - E001 pipeline URL is not https
//! - E002 version is not semantic
//! - E003 parameter declared twice
//! - E004 reserved parameter declared
//! - E005 template name not unique
//! - E006 template with empty body
//! - E007 reference to an undeclared parameter
//! - E008 resulting parameter not declared
//! - E009 parameter produced by several templates
//! - E010 input parameter produced by a template
//! - E011 output parameter never produced
//! - E012 intermediate parameter never produced
//! - E013 dependency cycle
//! - E014 unknown persona
//! - E015 unknown knowledge source

use ptbk_core::{is_reserved_parameter_name, PipelineJson};
use ptbk_parser::is_valid_semantic_version;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

/// One broken invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    InvalidPipelineUrl { url: String },
    InvalidVersion { version: String },
    DuplicateParameter { parameter: String },
    ReservedParameter { parameter: String },
    DuplicateTemplateName { template: String },
    EmptyContent { template: String },
    UndefinedParameter { template: String, parameter: String },
    ResultNotDeclared { template: String, parameter: String },
    DuplicateProducer { parameter: String, templates: Vec<String> },
    InputHasProducer { parameter: String, template: String },
    OutputWithoutProducer { parameter: String },
    UnresolvedParameter { parameter: String },
    /// Parameters along the cycle, first one repeated at the end
    Cycle { parameters: Vec<String> },
    UnknownPersona { template: String, persona: String },
    UnknownKnowledgeSource { template: String, source: String },
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPipelineUrl { .. } => "E001",
            Self::InvalidVersion { .. } => "E002",
            Self::DuplicateParameter { .. } => "E003",
            Self::ReservedParameter { .. } => "E004",
            Self::DuplicateTemplateName { .. } => "E005",
            Self::EmptyContent { .. } => "E006",
            Self::UndefinedParameter { .. } => "E007",
            Self::ResultNotDeclared { .. } => "E008",
            Self::DuplicateProducer { .. } => "E009",
            Self::InputHasProducer { .. } => "E010",
            Self::OutputWithoutProducer { .. } => "E011",
            Self::UnresolvedParameter { .. } => "E012",
            Self::Cycle { .. } => "E013",
            Self::UnknownPersona { .. } => "E014",
            Self::UnknownKnowledgeSource { .. } => "E015",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.code())?;
        match self {
            Self::InvalidPipelineUrl { url } => {
                write!(f, "Pipeline URL {url:?} is not an absolute https URL")
            }
            Self::InvalidVersion { version } => {
                write!(f, "Version {version:?} is not a valid semantic version")
            }
            Self::DuplicateParameter { parameter } => {
                write!(f, "Parameter {{{parameter}}} is declared more than once")
            }
            Self::ReservedParameter { parameter } => {
                write!(f, "Parameter {{{parameter}}} is reserved and can not be declared")
            }
            Self::DuplicateTemplateName { template } => {
                write!(f, "Template name {template:?} is used more than once")
            }
            Self::EmptyContent { template } => write!(f, "Template {template:?} has an empty body"),
            Self::UndefinedParameter {
                template,
                parameter,
            } => write!(
                f,
                "Template {template:?} depends on {{{parameter}}} which is not defined"
            ),
            Self::ResultNotDeclared {
                template,
                parameter,
            } => write!(
                f,
                "Template {template:?} produces {{{parameter}}} which is not declared"
            ),
            Self::DuplicateProducer {
                parameter,
                templates,
            } => write!(
                f,
                "Parameter {{{parameter}}} is produced by several templates: {}",
                templates.join(", ")
            ),
            Self::InputHasProducer {
                parameter,
                template,
            } => write!(
                f,
                "Input parameter {{{parameter}}} is also produced by template {template:?}"
            ),
            Self::OutputWithoutProducer { parameter } => {
                write!(f, "Output parameter {{{parameter}}} is not produced by any template")
            }
            Self::UnresolvedParameter { parameter } => write!(
                f,
                "Parameter {{{parameter}}} is neither an input nor produced by any template"
            ),
            Self::Cycle { parameters } => {
                let path = parameters
                    .iter()
                    .map(|p| format!("{{{p}}}"))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                write!(f, "Circular dependency between parameters: {path}")
            }
            Self::UnknownPersona { template, persona } => {
                write!(f, "Template {template:?} uses unknown persona {persona:?}")
            }
            Self::UnknownKnowledgeSource { template, source } => write!(
                f,
                "Template {template:?} uses unknown knowledge source {source:?}"
            ),
        }
    }
}

/// Every violation found in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Whether any violation mentions the given parameter
    pub fn mentions_parameter(&self, name: &str) -> bool {
        self.violations.iter().any(|violation| match violation {
            Violation::DuplicateParameter { parameter }
            | Violation::ReservedParameter { parameter }
            | Violation::UndefinedParameter { parameter, .. }
            | Violation::ResultNotDeclared { parameter, .. }
            | Violation::DuplicateProducer { parameter, .. }
            | Violation::InputHasProducer { parameter, .. }
            | Violation::OutputWithoutProducer { parameter }
            | Violation::UnresolvedParameter { parameter } => parameter == name,
            Violation::Cycle { parameters } => parameters.iter().any(|p| p == name),
            _ => false,
        })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline is invalid ({} problems):", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n- {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validate a compiled pipeline
pub fn validate_pipeline(pipeline: &PipelineJson) -> Result<(), ValidationError> {
    let violations = collect_violations(pipeline);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

/// Collect every violation without failing
pub fn collect_violations(pipeline: &PipelineJson) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_head(pipeline, &mut violations);
    check_parameters(pipeline, &mut violations);
    check_templates(pipeline, &mut violations);
    check_producers(pipeline, &mut violations);
    check_cycles(pipeline, &mut violations);

    violations
}

fn check_head(pipeline: &PipelineJson, violations: &mut Vec<Violation>) {
    if let Some(url) = &pipeline.pipeline_url {
        let host = url.strip_prefix("https://").unwrap_or_default();
        if host.is_empty() || host.starts_with('/') || url.chars().any(char::is_whitespace) {
            violations.push(Violation::InvalidPipelineUrl { url: url.clone() });
        }
    }

    if let Some(version) = &pipeline.promptbook_version {
        if !is_valid_semantic_version(version) {
            violations.push(Violation::InvalidVersion {
                version: version.clone(),
            });
        }
    }
}

fn check_parameters(pipeline: &PipelineJson, violations: &mut Vec<Violation>) {
    let mut seen = HashSet::new();

    for parameter in &pipeline.parameters {
        if !seen.insert(parameter.name.as_str()) {
            violations.push(Violation::DuplicateParameter {
                parameter: parameter.name.clone(),
            });
        }
        if is_reserved_parameter_name(&parameter.name) {
            violations.push(Violation::ReservedParameter {
                parameter: parameter.name.clone(),
            });
        }
    }
}

fn check_templates(pipeline: &PipelineJson, violations: &mut Vec<Violation>) {
    let mut names = HashSet::new();

    for template in &pipeline.prompt_templates {
        if !names.insert(template.name.as_str()) {
            violations.push(Violation::DuplicateTemplateName {
                template: template.name.clone(),
            });
        }

        if template.content.trim().is_empty() {
            violations.push(Violation::EmptyContent {
                template: template.title.clone(),
            });
        }

        for parameter in &template.dependent_parameter_names {
            if pipeline.parameter(parameter).is_none() {
                violations.push(Violation::UndefinedParameter {
                    template: template.title.clone(),
                    parameter: parameter.clone(),
                });
            }
        }

        if pipeline.parameter(&template.resulting_parameter_name).is_none() {
            violations.push(Violation::ResultNotDeclared {
                template: template.title.clone(),
                parameter: template.resulting_parameter_name.clone(),
            });
        }

        if let Some(persona) = &template.persona_name {
            if pipeline.persona(persona).is_none() {
                violations.push(Violation::UnknownPersona {
                    template: template.title.clone(),
                    persona: persona.clone(),
                });
            }
        }

        for source in &template.knowledge_source_names {
            if pipeline.knowledge_source(source).is_none() {
                violations.push(Violation::UnknownKnowledgeSource {
                    template: template.title.clone(),
                    source: source.clone(),
                });
            }
        }
    }
}

fn check_producers(pipeline: &PipelineJson, violations: &mut Vec<Violation>) {
    let mut producers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for template in &pipeline.prompt_templates {
        producers
            .entry(template.resulting_parameter_name.as_str())
            .or_default()
            .push(template.title.as_str());
    }

    for (parameter, templates) in &producers {
        if templates.len() > 1 {
            violations.push(Violation::DuplicateProducer {
                parameter: parameter.to_string(),
                templates: templates.iter().map(|t| t.to_string()).collect(),
            });
        }
    }

    for parameter in &pipeline.parameters {
        let produced_by = producers.get(parameter.name.as_str());

        if parameter.is_input {
            if let Some(templates) = produced_by {
                violations.push(Violation::InputHasProducer {
                    parameter: parameter.name.clone(),
                    template: templates[0].to_string(),
                });
            }
        } else if produced_by.is_none() {
            if parameter.is_output {
                violations.push(Violation::OutputWithoutProducer {
                    parameter: parameter.name.clone(),
                });
            } else {
                violations.push(Violation::UnresolvedParameter {
                    parameter: parameter.name.clone(),
                });
            }
        }
    }
}

/// Topologically sort the templates; whatever remains sits on or behind a cycle
fn check_cycles(pipeline: &PipelineJson, violations: &mut Vec<Violation>) {
    let templates = &pipeline.prompt_templates;

    let mut producer: HashMap<&str, usize> = HashMap::new();
    for (index, template) in templates.iter().enumerate() {
        producer
            .entry(template.resulting_parameter_name.as_str())
            .or_insert(index);
    }

    // predecessors[i]: templates whose result template i consumes
    let predecessors: Vec<Vec<usize>> = templates
        .iter()
        .map(|template| {
            template
                .dependent_parameter_names
                .iter()
                .filter_map(|name| producer.get(name.as_str()).copied())
                .collect()
        })
        .collect();

    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); templates.len()];
    for (index, preds) in predecessors.iter().enumerate() {
        for pred in preds {
            successors[*pred].push(index);
        }
    }

    let mut queue: VecDeque<usize> = (0..templates.len()).filter(|i| in_degree[*i] == 0).collect();
    let mut sorted = vec![false; templates.len()];

    while let Some(index) = queue.pop_front() {
        sorted[index] = true;
        for successor in &successors[index] {
            in_degree[*successor] -= 1;
            if in_degree[*successor] == 0 {
                queue.push_back(*successor);
            }
        }
    }

    let mut reported = vec![false; templates.len()];
    for start in 0..templates.len() {
        if sorted[start] || reported[start] {
            continue;
        }

        // Walk backwards through unsorted predecessors until a template repeats
        let mut path = vec![start];
        let mut position: HashMap<usize, usize> = HashMap::from([(start, 0)]);
        let mut current = start;

        let cycle_start = loop {
            let Some(next) = predecessors[current].iter().copied().find(|p| !sorted[*p]) else {
                break None;
            };
            if let Some(at) = position.get(&next) {
                break Some(*at);
            }
            position.insert(next, path.len());
            path.push(next);
            current = next;
        };

        let Some(cycle_start) = cycle_start else {
            continue;
        };

        let mut cycle: Vec<usize> = path[cycle_start..].to_vec();
        if cycle.iter().any(|index| reported[*index]) {
            continue;
        }
        for index in &cycle {
            reported[*index] = true;
        }

        // Walked against the data flow; report it along the flow
        cycle.reverse();
        let mut parameters: Vec<String> = cycle
            .iter()
            .map(|index| templates[*index].resulting_parameter_name.clone())
            .collect();
        parameters.push(parameters[0].clone());

        violations.push(Violation::Cycle { parameters });
    }
}
