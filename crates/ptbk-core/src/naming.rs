//! Parameter and template naming
//!
//! Parameter names are written in many shapes in the source (`{thing}`,
//! `` `{thing}` ``, `<thing>`, `my thing`) and normalized to one camel-cased
//! identifier before anything else sees them.

use crate::error::{CoreError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Names filled in by the executor; pipelines may reference but never declare them
pub const RESERVED_PARAMETER_NAMES: &[&str] =
    &["context", "knowledge", "samples", "modelName", "currentDate"];

/// Wrapping pairs stripped from a raw parameter name, outermost first
const WRAPPERS: &[(char, char)] = &[('`', '`'), ('{', '}'), ('[', ']'), ('(', ')'), ('<', '>')];

static PARAMETER_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("valid regex"));

/// Normalize arbitrary text to a camelCase identifier
///
/// Non-alphanumeric characters act as word boundaries and are dropped.
/// An uppercase letter directly after a lowercase one is kept as a boundary
/// so already camel-cased input is stable.
pub fn normalize_to_camel_case(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut at_boundary = false;
    let mut previous_lower = false;

    for ch in text.chars() {
        if !ch.is_alphanumeric() {
            at_boundary = true;
            continue;
        }

        if normalized.is_empty() {
            normalized.extend(ch.to_lowercase());
        } else if at_boundary || (ch.is_uppercase() && previous_lower) {
            normalized.extend(ch.to_uppercase());
        } else {
            normalized.extend(ch.to_lowercase());
        }

        previous_lower = ch.is_lowercase() || ch.is_numeric();
        at_boundary = false;
    }

    normalized
}

/// Turn a heading title into a kebab-case name, e.g. `Sample prompt` -> `sample-prompt`
pub fn title_to_name(title: &str) -> String {
    let mut name = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            name.extend(ch.to_lowercase());
        } else if !name.is_empty() && !name.ends_with('-') {
            name.push('-');
        }
    }
    while name.ends_with('-') {
        name.pop();
    }
    name
}

/// Validate a raw parameter name and return its canonical form
///
/// Surrounding backticks, braces, brackets, parentheses and angle brackets
/// are stripped first. Names with dots, slashes or inner brackets are
/// rejected, as are reserved names.
pub fn validate_parameter_name(raw: &str) -> Result<String> {
    let mut name = raw.trim();

    for (start, end) in WRAPPERS {
        if name.len() >= 2 && name.starts_with(*start) && name.ends_with(*end) {
            name = &name[start.len_utf8()..name.len() - end.len_utf8()];
        }
    }

    if name.contains('.') {
        return Err(CoreError::parameter_name(raw, "cannot contain dots"));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(CoreError::parameter_name(raw, "cannot contain slashes"));
    }

    if name
        .chars()
        .any(|c| matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | '<' | '>'))
    {
        return Err(CoreError::parameter_name(raw, "cannot contain braces"));
    }

    let normalized = normalize_to_camel_case(name);

    if normalized.is_empty() {
        return Err(CoreError::parameter_name(raw, "cannot be empty"));
    }

    if is_reserved_parameter_name(&normalized) {
        return Err(CoreError::parameter_name(
            raw,
            format!("{{{}}} is a reserved parameter name", normalized),
        ));
    }

    Ok(normalized)
}

/// Check whether a canonical name is on the reserved list
pub fn is_reserved_parameter_name(name: &str) -> bool {
    RESERVED_PARAMETER_NAMES.contains(&name)
}

/// Collect every `{parameterName}` placeholder in a template body
pub fn extract_parameter_names(template: &str) -> BTreeSet<String> {
    PARAMETER_REFERENCE_RE
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_to_camel_case() {
        assert_eq!(normalize_to_camel_case("thing"), "thing");
        assert_eq!(normalize_to_camel_case("my thing"), "myThing");
        assert_eq!(normalize_to_camel_case("myThing"), "myThing");
        assert_eq!(normalize_to_camel_case("MyThing"), "myThing");
        assert_eq!(normalize_to_camel_case("THING"), "thing");
        assert_eq!(normalize_to_camel_case("some_name_2"), "someName2");
        assert_eq!(normalize_to_camel_case("  "), "");
    }

    #[test]
    fn test_title_to_name() {
        assert_eq!(title_to_name("Prompt"), "prompt");
        assert_eq!(title_to_name("Sample prompt"), "sample-prompt");
        assert_eq!(title_to_name("  Write a *poem*!  "), "write-a-poem");
    }

    #[test]
    fn test_validate_parameter_name_strips_wrappers() {
        assert_eq!(validate_parameter_name("{thing}").unwrap(), "thing");
        assert_eq!(validate_parameter_name("`{customer}`").unwrap(), "customer");
        assert_eq!(validate_parameter_name("<my name>").unwrap(), "myName");
        assert_eq!(validate_parameter_name("[thing]").unwrap(), "thing");
        assert_eq!(validate_parameter_name("(thing)").unwrap(), "thing");
    }

    #[test]
    fn test_validate_parameter_name_rejects_malformed() {
        assert!(validate_parameter_name("{a.b}").is_err());
        assert!(validate_parameter_name("{a/b}").is_err());
        assert!(validate_parameter_name("a\\b").is_err());
        assert!(validate_parameter_name("{{thing}}").is_err());
        assert!(validate_parameter_name("{}").is_err());
    }

    #[test]
    fn test_validate_parameter_name_rejects_reserved() {
        let err = validate_parameter_name("{knowledge}").unwrap_err();
        assert!(err.to_string().contains("reserved"));
        assert!(validate_parameter_name("{current date}").is_err());
    }

    #[test]
    fn test_extract_parameter_names() {
        let names = extract_parameter_names("I bought {thing}.\nNow I have {thing} and {other_1}.");
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["other_1".to_string(), "thing".to_string()]
        );
        assert!(extract_parameter_names("{\"json\": true}").is_empty());
    }
}
