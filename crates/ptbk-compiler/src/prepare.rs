//! Preparation state of a pipeline
//!
//! Preparation (done by the execution layer) resolves persona model
//! requirements, indexes knowledge sources and inlines them into template
//! bodies. These helpers inspect and strip that state.

use ptbk_core::{extract_parameter_names, normalize_to_camel_case, PipelineJson};
use std::collections::BTreeSet;

/// Whether every persona and knowledge source carries preparation data
pub fn is_pipeline_prepared(pipeline: &PipelineJson) -> bool {
    let personas_prepared = pipeline
        .personas
        .iter()
        .all(|persona| persona.model_requirements.is_some());

    let knowledge_prepared = pipeline
        .knowledge_sources
        .iter()
        .all(|source| source.preparation_ids.is_some());

    personas_prepared && knowledge_prepared
}

/// Copy of the pipeline with all preparation data removed
///
/// Parameters that only the prepared content referenced are dropped from
/// the template dependencies along with it.
pub fn unprepare_pipeline(pipeline: &PipelineJson) -> PipelineJson {
    let mut unprepared = pipeline.clone();

    for persona in &mut unprepared.personas {
        persona.model_requirements = None;
        persona.preparation_ids = None;
    }

    for source in &mut unprepared.knowledge_sources {
        source.preparation_ids = None;
    }

    for template in &mut unprepared.prompt_templates {
        let Some(prepared) = template.prepared_content.take() else {
            continue;
        };

        let only_prepared: BTreeSet<String> = referenced_names(&prepared)
            .difference(&referenced_names(&template.content))
            .cloned()
            .collect();
        let jokers = &template.joker_parameter_names;
        template
            .dependent_parameter_names
            .retain(|name| !only_prepared.contains(name) || jokers.contains(name));
    }

    log::debug!("unprepared pipeline {:?}", unprepared.title);
    unprepared
}

/// Canonical names of the placeholders in a body
fn referenced_names(body: &str) -> BTreeSet<String> {
    extract_parameter_names(body)
        .iter()
        .map(|name| normalize_to_camel_case(name))
        .collect()
}
