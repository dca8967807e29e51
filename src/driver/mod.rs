//! Agent Driver: executes a single coding session against an LLM CLI,
//! enforcing the sandbox on every tool dispatch and reporting the outcome
//! back through the Tracker Adapter.

mod cli;
mod events;
mod executor;
mod tools;

pub use cli::CliConfig;
pub use events::{AgentEvent, ToolUse, Usage};
pub use executor::{FsShellExecutor, ToolExecutor};
pub use tools::{declare_tools, ToolDeclaration};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{SessionKind, WorkItem, WorkItemId, WorkItemStatus};
use crate::retrieval::RetrievalEngine;
use crate::sandbox::{PolicyDecision, ToolCall, ToolPolicy};
use crate::tracker::{ItemFilter, TrackerClient, TrackerError};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to spawn LLM CLI: {0}")]
    Spawn(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error("session produced no result event")]
    NoResult,
}

/// Outcome of running one coding session to completion.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub item_id: WorkItemId,
    pub summary: String,
    pub usage: Usage,
    pub succeeded: bool,
}

/// Phrases in an assistant turn that mark a well-formed conclusion. Real
/// completion is signalled by the CLI's terminal `result` event; this
/// supplements it for providers that only emit plain JSON.
const CONCLUSION_MARKERS: &[&str] = &["task complete", "done", "finished"];

pub struct AgentDriver {
    tracker: Arc<dyn TrackerClient>,
    executor: Arc<dyn ToolExecutor>,
    policy: ToolPolicy,
    cli_config: CliConfig,
    project_root: PathBuf,
    /// Tracker project this driver's sessions run against. Empty until
    /// `with_project_id` is called; needed to dispatch `tracker_list_items`
    /// and `tracker_pick_item`, which the tracker scopes by project.
    project_id: String,
    retrieval: Option<Arc<RetrievalEngine>>,
}

impl AgentDriver {
    pub fn new(
        tracker: Arc<dyn TrackerClient>,
        policy: ToolPolicy,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tracker,
            executor: Arc::new(FsShellExecutor),
            policy,
            cli_config: CliConfig::default(),
            project_root: project_root.into(),
            project_id: String::new(),
            retrieval: None,
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_cli_config(mut self, cli_config: CliConfig) -> Self {
        self.cli_config = cli_config;
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn with_retrieval_engine(mut self, retrieval: Arc<RetrievalEngine>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    /// Run one coding session for `item` against the LLM CLI. Sets the item
    /// to `in_progress` before starting; on a well-formed conclusion,
    /// appends a structured comment and transitions to `done`; on failure,
    /// attaches the error (leaving the item `in_progress`, or resetting to
    /// `todo` when `auto_retry` is set).
    pub async fn run_session(
        &self,
        item: &WorkItem,
        kind: SessionKind,
        prompt: &str,
        auto_retry: bool,
        meta_item_id: WorkItemId,
    ) -> Result<SessionOutcome, DriverError> {
        self.tracker.set_status(item.id, WorkItemStatus::InProgress).await?;

        let _declared_tools = declare_tools(kind);
        let run_result = cli::run_stream_json(&self.cli_config, &self.project_root, prompt).await;

        let events = match run_result {
            Ok(events) => events,
            Err(err) => {
                self.record_failure(item.id, &err.to_string(), auto_retry).await?;
                return Ok(SessionOutcome { item_id: item.id, summary: String::new(), usage: Usage::default(), succeeded: false });
            }
        };

        let mut final_summary = None;
        let mut final_usage = Usage::default();
        let mut transcript = Vec::new();

        for event in &events {
            match event {
                AgentEvent::AssistantTurn { content, tool_uses } => {
                    transcript.push(content.clone());
                    for tool_use in tool_uses {
                        let output = self.dispatch_tool(tool_use, item.id, meta_item_id).await;
                        transcript.push(format!("[tool {} -> {}]", tool_use.name, output));
                    }
                }
                AgentEvent::Result { summary, usage } => {
                    final_summary = Some(summary.clone());
                    final_usage = *usage;
                }
                AgentEvent::SystemInit { .. } | AgentEvent::ToolResult { .. } => {}
            }
        }

        match final_summary {
            Some(summary) => {
                let comment = format!("Session completed.\n\n{summary}");
                self.tracker.append_comment(item.id, &comment).await?;
                self.tracker.set_status(item.id, WorkItemStatus::Done).await?;
                let meta_comment = format!("Session on \"{}\" completed.\n\n{summary}", item.title);
                self.tracker.append_comment(meta_item_id, &meta_comment).await?;
                info!(item_id = %item.id, "session completed successfully");
                Ok(SessionOutcome { item_id: item.id, summary, usage: final_usage, succeeded: true })
            }
            None => {
                let last_turns = transcript.iter().rev().take(3).cloned().collect::<Vec<_>>().join("\n---\n");
                self.record_failure(item.id, &format!("no result event observed; last turns:\n{last_turns}"), auto_retry)
                    .await?;
                Ok(SessionOutcome { item_id: item.id, summary: String::new(), usage: final_usage, succeeded: false })
            }
        }
    }

    async fn record_failure(&self, item_id: WorkItemId, reason: &str, auto_retry: bool) -> Result<(), DriverError> {
        warn!(item_id = %item_id, %reason, "session failed");
        self.tracker.append_comment(item_id, &format!("Session failed: {reason}")).await?;
        if auto_retry {
            self.tracker.set_status(item_id, WorkItemStatus::Todo).await?;
        }
        Ok(())
    }

    async fn dispatch_tool(&self, tool_use: &ToolUse, _item_id: WorkItemId, meta_item_id: WorkItemId) -> String {
        match tool_use.name.as_str() {
            "tracker_list_items" => self.dispatch_tracker_list_items(tool_use).await,
            "tracker_pick_item" => self.dispatch_tracker_pick_item().await,
            "tracker_update_item" => self.dispatch_tracker_update_item(tool_use).await,
            "tracker_append_comment" => self.dispatch_tracker_append_comment(tool_use).await,
            "tracker_update_meta_item" => self.dispatch_tracker_update_meta_item(tool_use, meta_item_id).await,
            "retrieval_query" => self.dispatch_retrieval_query(tool_use).await,
            _ => self.dispatch_sandboxed(tool_use).await,
        }
    }

    async fn dispatch_sandboxed(&self, tool_use: &ToolUse) -> String {
        let call = ToolCall {
            name: tool_use.name.clone(),
            shell_command: if tool_use.name == "bash" {
                tool_use.input.get("command").and_then(|c| c.as_str()).map(str::to_string)
            } else {
                None
            },
            write_path: if matches!(tool_use.name.as_str(), "write" | "edit") {
                tool_use.input.get("path").and_then(|p| p.as_str()).map(|p| self.project_root.join(p))
            } else {
                None
            },
        };

        match self.policy.check(&call) {
            PolicyDecision::Allow => self.executor.execute(tool_use, &self.project_root).await,
            PolicyDecision::Deny { reason } => format!("denied: {reason}"),
        }
    }

    async fn dispatch_tracker_list_items(&self, tool_use: &ToolUse) -> String {
        let status = tool_use
            .input
            .get("status")
            .and_then(|s| s.as_str())
            .and_then(|raw| serde_json::from_str::<WorkItemStatus>(&format!("\"{raw}\"")).ok());
        match self.tracker.list_items(&self.project_id, ItemFilter { status, priority: None }).await {
            Ok(items) => serde_json::to_string(&items).unwrap_or_else(|e| format!("error: {e}")),
            Err(e) => format!("error: {e}"),
        }
    }

    async fn dispatch_tracker_pick_item(&self) -> String {
        match self.tracker.pick_highest_priority(&self.project_id).await {
            Ok(item) => serde_json::to_string(&item).unwrap_or_else(|e| format!("error: {e}")),
            Err(e) => format!("error: {e}"),
        }
    }

    async fn dispatch_tracker_update_item(&self, tool_use: &ToolUse) -> String {
        let Some(item_id) = tool_use.input.get("item_id").and_then(|v| v.as_str()).and_then(|s| s.parse::<WorkItemId>().ok())
        else {
            return "error: missing or invalid item_id".to_string();
        };
        let Some(status) = tool_use
            .input
            .get("status")
            .and_then(|s| s.as_str())
            .and_then(|raw| serde_json::from_str::<WorkItemStatus>(&format!("\"{raw}\"")).ok())
        else {
            return "error: missing or invalid status".to_string();
        };
        match self.tracker.set_status(item_id, status).await {
            Ok(()) => "ok".to_string(),
            Err(e) => format!("error: {e}"),
        }
    }

    async fn dispatch_tracker_append_comment(&self, tool_use: &ToolUse) -> String {
        let Some(item_id) = tool_use.input.get("item_id").and_then(|v| v.as_str()).and_then(|s| s.parse::<WorkItemId>().ok())
        else {
            return "error: missing or invalid item_id".to_string();
        };
        let Some(body) = tool_use.input.get("body").and_then(|b| b.as_str()) else {
            return "error: missing body".to_string();
        };
        match self.tracker.append_comment(item_id, body).await {
            Ok(()) => "ok".to_string(),
            Err(e) => format!("error: {e}"),
        }
    }

    async fn dispatch_tracker_update_meta_item(&self, tool_use: &ToolUse, meta_item_id: WorkItemId) -> String {
        let Some(body) = tool_use.input.get("body").and_then(|b| b.as_str()) else {
            return "error: missing body".to_string();
        };
        match self.tracker.append_comment(meta_item_id, body).await {
            Ok(()) => "ok".to_string(),
            Err(e) => format!("error: {e}"),
        }
    }

    async fn dispatch_retrieval_query(&self, tool_use: &ToolUse) -> String {
        let Some(retrieval) = &self.retrieval else {
            return "error: retrieval engine not available for this session".to_string();
        };
        let Some(query) = tool_use.input.get("query").and_then(|q| q.as_str()) else {
            return "error: missing query".to_string();
        };
        let mode = tool_use.input.get("mode").and_then(|m| m.as_str()).unwrap_or("auto");
        let filters = crate::retrieval::RetrievalFilters::default();
        let result = match mode {
            "simple" => retrieval.simple(query, 5, &filters).await,
            "summary" => retrieval.summary(query, 5, &filters).await,
            "hierarchical" => retrieval.hierarchical(query, 3, 5, &filters).await,
            _ => retrieval.auto(query, 5, &filters).await,
        };
        match result {
            Ok(result) => {
                let texts: Vec<&str> = result.hits.iter().map(|h| h.text.as_str()).collect();
                serde_json::json!({"mode": format!("{:?}", result.mode), "hits": texts}).to_string()
            }
            Err(e) => format!("error: {e}"),
        }
    }
}

fn _looks_concluded(text: &str) -> bool {
    let lower = text.to_lowercase();
    CONCLUSION_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[allow(dead_code)]
fn session_dir_for(project_root: &Path, session_id: &str) -> PathBuf {
    crate::env::agent_logs_dir_path(project_root, session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::MockTrackerClient;

    #[tokio::test]
    async fn denied_shell_tool_is_reported_as_denied_not_executed() {
        let tmp = tempfile::tempdir().unwrap();
        let tracker = Arc::new(MockTrackerClient::new());
        let project_id = tracker.create_project("p", "d").await.unwrap();
        let item = WorkItem::new("t".into(), "d".into(), 1, "c".into(), "s".into());
        let item_id = tracker.create_item(&project_id, item.clone()).await.unwrap();

        let policy = ToolPolicy::new(tmp.path());
        let driver = AgentDriver::new(tracker.clone(), policy, tmp.path());

        let tool_use = ToolUse {
            id: "1".into(),
            name: "bash".into(),
            input: serde_json::json!({"command": "rm -rf /"}),
        };
        let output = driver.dispatch_tool(&tool_use, item_id, uuid::Uuid::nil()).await;
        assert!(output.starts_with("denied:"));
    }
}
