//! Ambient-stack coverage: layered TOML config round-trips through a file,
//! and the specification parser is idempotent and format-agnostic.

use rag_agent::config::AppConfig;
use rag_agent::specparse::parse_spec;

#[test]
fn app_config_round_trips_through_a_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rag-agent.toml");

    let mut config = AppConfig::default();
    config.agent.tracker_url = "http://tracker.internal:4000".to_string();
    config.agent.max_iterations = 42;
    config.corpus.embedding_model_name = "bge-m3".to_string();

    config.to_toml_file(&path).unwrap();
    let loaded = AppConfig::from_toml_file(&path).unwrap();

    assert_eq!(loaded.agent.tracker_url, "http://tracker.internal:4000");
    assert_eq!(loaded.agent.max_iterations, 42);
    assert_eq!(loaded.corpus.embedding_model_name, "bge-m3");
}

#[test]
fn loading_a_missing_config_file_is_an_error() {
    let result = AppConfig::from_toml_file("/nonexistent/rag-agent.toml");
    assert!(result.is_err());
}

const TOML_SPEC: &str = r#"
project_name = "tool"
overview = "a cli tool, library-shaped"
technology_stack = ["rust"]

[[features]]
title = "parse args"
description = "d"
priority = 1
category = "backend"
test_steps = "s"
"#;

const JSON_SPEC: &str = r#"
{
  "project_name": "tool",
  "overview": "a json-encoded spec",
  "technology_stack": ["rust"],
  "features": [
    {"title": "parse args", "description": "d", "priority": 1, "category": "backend", "test_steps": "s"}
  ]
}
"#;

#[test]
fn parse_spec_accepts_both_toml_and_json() {
    let toml_spec = parse_spec(TOML_SPEC).unwrap();
    let json_spec = parse_spec(JSON_SPEC).unwrap();

    assert_eq!(toml_spec.features.len(), 1);
    assert_eq!(json_spec.features.len(), 1);
    assert_eq!(toml_spec.features[0].title, json_spec.features[0].title);
}

#[test]
fn parse_spec_is_idempotent_on_repeated_parses() {
    let first = parse_spec(TOML_SPEC).unwrap();
    let second = parse_spec(TOML_SPEC).unwrap();
    assert_eq!(first.features, second.features);
    assert_eq!(first.project_name, second.project_name);
}

#[test]
fn parse_spec_rejects_duplicate_feature_titles() {
    let duplicated = r#"
project_name = "tool"
overview = "o"

[[features]]
title = "same"
description = "d"
priority = 1
category = "c"
test_steps = "s"

[[features]]
title = "same"
description = "d2"
priority = 2
category = "c"
test_steps = "s"
"#;
    let result = parse_spec(duplicated);
    assert!(result.is_err());
}
