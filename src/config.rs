//! Configuration discovery and loading.
//!
//! Discovery hierarchy, in priority order:
//! 1. Current directory: `./rag-agent.toml` or `./.rag-agent/config.toml`
//! 2. User config: `~/.rag-agent/config.toml`
//! 3. System config: `/etc/rag-agent/config.toml` (Unix-like systems)
//! 4. Built-in defaults
//!
//! Every field below can also be set by an environment variable of the
//! form `RAG_AGENT_<SECTION>_<FIELD>` (uppercased), which overrides
//! whatever the discovered file contains.

use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::env;

/// Tracker credentials and loop-control settings for the Session Orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLoopConfig {
    pub tracker_url: String,
    #[serde(default)]
    pub tracker_api_key: Option<String>,
    #[serde(default)]
    pub llm_oauth_token: Option<String>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_auto_continue_delay_seconds")]
    pub auto_continue_delay_seconds: u64,
    #[serde(default)]
    pub project_dir: Option<PathBuf>,
}

fn default_max_iterations() -> u32 {
    100
}

fn default_auto_continue_delay_seconds() -> u64 {
    3
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            tracker_url: "http://localhost:3000".to_string(),
            tracker_api_key: None,
            llm_oauth_token: None,
            max_iterations: default_max_iterations(),
            auto_continue_delay_seconds: default_auto_continue_delay_seconds(),
            project_dir: None,
        }
    }
}

/// Document-ingestion and retrieval settings for Core B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_structure_llm_provider")]
    pub structure_llm_provider: String,
    #[serde(default = "default_structure_llm_model")]
    pub structure_llm_model: String,
    #[serde(default = "default_structure_llm_temperature")]
    pub structure_llm_temperature: f32,
    #[serde(default)]
    pub ocr_api_key: Option<String>,
    #[serde(default = "default_vector_store_url")]
    pub vector_store_url: String,
    #[serde(default = "default_embedding_model_name")]
    pub embedding_model_name: String,
}

fn default_structure_llm_provider() -> String {
    "local".to_string()
}
fn default_structure_llm_model() -> String {
    "claude-haiku".to_string()
}
fn default_structure_llm_temperature() -> f32 {
    0.2
}
fn default_vector_store_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_embedding_model_name() -> String {
    "bge-m3".to_string()
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            structure_llm_provider: default_structure_llm_provider(),
            structure_llm_model: default_structure_llm_model(),
            structure_llm_temperature: default_structure_llm_temperature(),
            ocr_api_key: None,
            vector_store_url: default_vector_store_url(),
            embedding_model_name: default_embedding_model_name(),
        }
    }
}

/// Top-level, TOML-backed application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentLoopConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
}

impl AppConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply `RAG_AGENT_*` environment overrides on top of whatever the file
    /// contained. Only the handful of fields an operator is likely to need
    /// to override without editing the file are covered.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std_env::var("RAG_AGENT_TRACKER_URL") {
            self.agent.tracker_url = url;
        }
        if let Ok(key) = std_env::var("RAG_AGENT_TRACKER_API_KEY") {
            self.agent.tracker_api_key = Some(key);
        }
        if let Ok(token) = std_env::var("RAG_AGENT_LLM_OAUTH_TOKEN") {
            self.agent.llm_oauth_token = Some(token);
        }
        if let Ok(url) = std_env::var("RAG_AGENT_VECTOR_STORE_URL") {
            self.corpus.vector_store_url = url;
        }
        if let Ok(key) = std_env::var("RAG_AGENT_OCR_API_KEY") {
            self.corpus.ocr_api_key = Some(key);
        }
    }
}

/// Configuration discovery across the on-disk hierarchy.
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    pub fn discover_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
        if let Some(path) = Self::find_config_file() {
            info!(path = %path.display(), "loading configuration");
            return AppConfig::from_toml_file(path);
        }
        info!("no configuration file found, using defaults");
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn find_config_file() -> Option<PathBuf> {
        Self::get_config_candidates().into_iter().find(|candidate| {
            debug!(path = %candidate.display(), "checking for config file");
            candidate.is_file()
        })
    }

    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join("rag-agent.toml"));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/rag-agent/config.toml"));

        candidates
    }

    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME").ok().or_else(|| std_env::var("USERPROFILE").ok()).map(PathBuf::from)
    }

    pub fn show_discovery_info() {
        println!("Configuration discovery hierarchy:");
        println!();
        let candidates = Self::get_config_candidates();
        for (i, candidate) in candidates.iter().enumerate() {
            let status = if candidate.is_file() { "EXISTS" } else { "not found" };
            println!("  {}. {} - {}", i + 1, candidate.display(), status);
        }
        println!();
        match Self::find_config_file() {
            Some(found) => println!("Active configuration: {}", found.display()),
            None => println!("Active configuration: built-in defaults"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_sensible_values() {
        let config = AppConfig::default();
        assert_eq!(config.agent.max_iterations, 100);
        assert_eq!(config.corpus.vector_store_url, "http://localhost:8080");
        assert_eq!(config.corpus.structure_llm_temperature, 0.2);
    }

    #[test]
    fn round_trips_through_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.agent.tracker_url = "http://tracker.example".to_string();

        config.to_toml_file(&path).unwrap();
        let loaded = AppConfig::from_toml_file(&path).unwrap();
        assert_eq!(loaded.agent.tracker_url, "http://tracker.example");
    }

    #[test]
    fn config_candidates_start_with_current_directory() {
        let candidates = ConfigDiscovery::get_config_candidates();
        assert!(!candidates.is_empty());
        assert_eq!(candidates[0].file_name().unwrap(), "rag-agent.toml");
    }
}
