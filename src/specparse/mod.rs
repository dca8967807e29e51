//! Specification Parser: translates a hierarchical project specification
//! document into an ordered list of `FeatureDescriptor`s, one per
//! `feature_N` node, preserving document order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("spec document is neither valid TOML nor valid JSON: {0}")]
    UnrecognizedFormat(String),
    #[error("duplicate feature title: {0}")]
    DuplicateFeatureTitle(String),
    #[error("spec document has no project_name")]
    MissingProjectName,
}

/// One `feature_N` node, materialised in document order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureDescriptor {
    pub title: String,
    pub description: String,
    pub priority: u8,
    pub category: String,
    pub test_steps: String,
}

/// A parsed project specification document.
#[derive(Debug, Clone)]
pub struct ProjectSpec {
    pub project_name: String,
    pub overview: String,
    pub technology_stack: Vec<String>,
    pub features: Vec<FeatureDescriptor>,
}

/// Raw on-disk shape. `feature_N` keys are collected via `features` in both
/// the TOML and JSON encodings this implementation accepts.
#[derive(Debug, Deserialize)]
struct RawProjectSpec {
    project_name: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    technology_stack: Vec<String>,
    #[serde(default)]
    features: Vec<FeatureDescriptor>,
}

/// Parse a spec document, detecting TOML vs JSON by content. Tries JSON
/// first when the trimmed text starts with `{`, otherwise TOML; falls back
/// to the other format on failure before giving up.
pub fn parse_spec(text: &str) -> Result<ProjectSpec, SpecError> {
    let trimmed = text.trim_start();
    let raw = if trimmed.starts_with('{') {
        serde_json::from_str::<RawProjectSpec>(text)
            .or_else(|_| toml::from_str::<RawProjectSpec>(text))
            .map_err(|e| SpecError::UnrecognizedFormat(e.to_string()))?
    } else {
        toml::from_str::<RawProjectSpec>(text)
            .or_else(|_| serde_json::from_str::<RawProjectSpec>(text))
            .map_err(|e| SpecError::UnrecognizedFormat(e.to_string()))?
    };

    if raw.project_name.trim().is_empty() {
        return Err(SpecError::MissingProjectName);
    }

    let mut seen_titles = HashSet::new();
    for feature in &raw.features {
        if !seen_titles.insert(feature.title.clone()) {
            return Err(SpecError::DuplicateFeatureTitle(feature.title.clone()));
        }
    }

    Ok(ProjectSpec {
        project_name: raw.project_name,
        overview: raw.overview,
        technology_stack: raw.technology_stack,
        features: raw.features,
    })
}

/// Keywords in the spec's `overview`/`technology_stack` that suggest a
/// library-style project (tested via type-checker and unit-test runner)
/// rather than a web project (browser automation for UI tests).
const LIBRARY_KEYWORDS: &[&str] = &["type safety", "docstrings", "strict type", "library rag", "type-checker"];

/// `true` iff the spec's free-text fields look like a library project.
pub fn looks_like_library_project(spec: &ProjectSpec) -> bool {
    let haystack = format!("{} {}", spec.overview, spec.technology_stack.join(" ")).to_lowercase();
    LIBRARY_KEYWORDS.iter().any(|kw| haystack.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_SPEC: &str = r#"
project_name = "demo"
overview = "a small library with strict type safety and docstrings"
technology_stack = ["rust"]

[[features]]
title = "parse input"
description = "parse the input format"
priority = 1
category = "backend"
test_steps = "run unit tests"

[[features]]
title = "emit output"
description = "emit the output format"
priority = 2
category = "backend"
test_steps = "run unit tests"
"#;

    const JSON_SPEC: &str = r#"{
        "project_name": "demo",
        "overview": "a web app",
        "technology_stack": ["typescript"],
        "features": [
            {"title": "login", "description": "d", "priority": 1, "category": "frontend", "test_steps": "click login"}
        ]
    }"#;

    #[test]
    fn parses_toml_preserving_feature_order() {
        let spec = parse_spec(TOML_SPEC).unwrap();
        assert_eq!(spec.project_name, "demo");
        assert_eq!(spec.features.len(), 2);
        assert_eq!(spec.features[0].title, "parse input");
        assert_eq!(spec.features[1].title, "emit output");
        assert!(looks_like_library_project(&spec));
    }

    #[test]
    fn parses_json_and_detects_web_project() {
        let spec = parse_spec(JSON_SPEC).unwrap();
        assert_eq!(spec.features.len(), 1);
        assert!(!looks_like_library_project(&spec));
    }

    #[test]
    fn rejects_duplicate_feature_titles() {
        let text = r#"
project_name = "demo"

[[features]]
title = "same"
description = "d"
priority = 1
category = "backend"
test_steps = "s"

[[features]]
title = "same"
description = "d2"
priority = 2
category = "backend"
test_steps = "s2"
"#;
        let err = parse_spec(text).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateFeatureTitle(title) if title == "same"));
    }

    #[test]
    fn rejects_blank_project_name() {
        let err = parse_spec("project_name = \"\"\noverview = \"x\"").unwrap_err();
        assert!(matches!(err, SpecError::MissingProjectName));
    }

    #[test]
    fn rejects_unrecognized_format() {
        let err = parse_spec("not valid toml or json {{{").unwrap_err();
        assert!(matches!(err, SpecError::UnrecognizedFormat(_)));
    }
}
