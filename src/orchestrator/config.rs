use std::time::Duration;

/// Tunables for the session orchestrator, grounded on the teacher's
/// `SessionManagerConfig` shape.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_iterations: u32,
    pub sleep_delay: Duration,
    pub stop_phrases: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            sleep_delay: Duration::from_secs(3),
            stop_phrases: vec!["feature-complete".to_string(), "all issues completed".to_string()],
        }
    }
}
