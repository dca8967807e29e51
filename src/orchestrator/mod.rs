//! Session Orchestrator: the outer state machine that drives repeated
//! coding sessions to completion, delegating work selection to the Tracker
//! Adapter rather than keeping its own priority queue.

mod config;
mod state;

pub use config::OrchestratorConfig;
pub use state::OrchestratorState;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{ProjectMarker, SessionKind, WorkItemStatus};
use crate::specparse::{self, ProjectSpec, SpecError};
use crate::tracker::{ItemFilter, TrackerClient, TrackerError};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("spec parse error: {0}")]
    Spec(#[from] SpecError),
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error("project already initialized; pass extend to add features instead")]
    AlreadyInitialized,
    #[error("no project marker found; run init first")]
    NotInitialized,
}

/// Outcome of a single call to [`SessionOrchestrator::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// A coding session should run for the returned item id.
    RunSession { item_id: uuid::Uuid, kind: SessionKind },
    /// The orchestrator is between iterations; the caller should sleep for
    /// the configured delay then call `step` again.
    Sleep,
    /// A terminal stop sentinel was reached; no further sessions will run.
    Terminated { reason: String },
}

/// Drives the `fresh -> initializing|extending|coding -> sleeping -> ...
/// -> terminated` state machine described by the orchestrator's contract.
/// Holds no task queue of its own: `pick_highest_priority` on the tracker is
/// the single source of truth for what runs next.
pub struct SessionOrchestrator {
    tracker: Arc<dyn TrackerClient>,
    project_id: String,
    config: OrchestratorConfig,
    state: OrchestratorState,
    iteration: u32,
    session_kind: SessionKind,
    meta_item_id: uuid::Uuid,
}

impl SessionOrchestrator {
    /// Bootstrap a brand-new project: parse `spec_text`, create the
    /// project and its items, and mark the project initialized.
    pub async fn init(
        tracker: Arc<dyn TrackerClient>,
        spec_text: &str,
        config: OrchestratorConfig,
        existing_marker: Option<ProjectMarker>,
        extend: bool,
    ) -> Result<(Self, ProjectSpec), OrchestratorError> {
        let spec = specparse::parse_spec(spec_text)?;

        match (&existing_marker, extend) {
            (None, _) => {
                let project_id = tracker.create_project(&spec.project_name, &spec.overview).await?;
                for feature in &spec.features {
                    let item = crate::domain::WorkItem::new(
                        feature.title.clone(),
                        feature.description.clone(),
                        feature.priority,
                        feature.category.clone(),
                        feature.test_steps.clone(),
                    );
                    tracker.create_item(&project_id, item).await?;
                }
                let meta_item_id = Self::create_meta_item(tracker.as_ref(), &project_id).await?;
                let kind = if specparse::looks_like_library_project(&spec) {
                    SessionKind::Library
                } else {
                    SessionKind::Web
                };
                info!(project = %spec.project_name, "initialized new project");
                Ok((
                    Self {
                        tracker,
                        project_id,
                        config,
                        state: OrchestratorState::Initializing,
                        iteration: 0,
                        session_kind: kind,
                        meta_item_id,
                    },
                    spec,
                ))
            }
            (Some(marker), true) => {
                for feature in &spec.features {
                    let item = crate::domain::WorkItem::new(
                        feature.title.clone(),
                        feature.description.clone(),
                        feature.priority,
                        feature.category.clone(),
                        feature.test_steps.clone(),
                    );
                    tracker.create_item(&marker.project_id, item).await?;
                }
                info!(project_id = %marker.project_id, "extended project with additional features");
                let kind = if specparse::looks_like_library_project(&spec) {
                    SessionKind::Library
                } else {
                    SessionKind::Web
                };
                Ok((
                    Self {
                        tracker,
                        project_id: marker.project_id.clone(),
                        config,
                        state: OrchestratorState::Extending,
                        iteration: 0,
                        session_kind: kind,
                        meta_item_id: marker.meta_item_id,
                    },
                    spec,
                ))
            }
            (Some(_), false) => Err(OrchestratorError::AlreadyInitialized),
        }
    }

    /// Create the meta item used for cross-session narration, then move it
    /// straight out of `Todo` so `pick_highest_priority` never selects it as
    /// a coding-session target.
    async fn create_meta_item(tracker: &dyn TrackerClient, project_id: &str) -> Result<uuid::Uuid, OrchestratorError> {
        let item = crate::domain::WorkItem::new(
            "Session log".to_string(),
            "Meta item: not a feature. Carries the cross-session narration appended after every coding session.".to_string(),
            4,
            "meta".to_string(),
            String::new(),
        );
        let meta_item_id = tracker.create_item(project_id, item).await?;
        tracker.set_status(meta_item_id, WorkItemStatus::InProgress).await?;
        Ok(meta_item_id)
    }

    /// Resume a project that already has a marker, skipping spec parsing.
    pub fn resume(
        tracker: Arc<dyn TrackerClient>,
        marker: &ProjectMarker,
        config: OrchestratorConfig,
        session_kind: SessionKind,
    ) -> Self {
        Self {
            tracker,
            project_id: marker.project_id.clone(),
            config,
            state: OrchestratorState::Coding,
            iteration: 0,
            session_kind,
            meta_item_id: marker.meta_item_id,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn meta_item_id(&self) -> uuid::Uuid {
        self.meta_item_id
    }

    /// Advance the state machine by one step. Does not itself run a coding
    /// session -- callers execute the returned `RunSession` outcome and then
    /// call `record_iteration_result` before the next `step`.
    pub async fn step(&mut self) -> Result<StepOutcome, OrchestratorError> {
        match self.state {
            OrchestratorState::Initializing | OrchestratorState::Extending => {
                self.state = OrchestratorState::Coding;
                self.step_coding().await
            }
            OrchestratorState::Coding => self.step_coding().await,
            OrchestratorState::Sleeping => {
                self.state = OrchestratorState::Coding;
                Ok(StepOutcome::Sleep)
            }
            OrchestratorState::Terminated => Ok(StepOutcome::Terminated {
                reason: "already terminated".to_string(),
            }),
        }
    }

    async fn step_coding(&mut self) -> Result<StepOutcome, OrchestratorError> {
        if self.iteration >= self.config.max_iterations {
            self.state = OrchestratorState::Terminated;
            return Ok(StepOutcome::Terminated {
                reason: "iteration counter reached max".to_string(),
            });
        }

        let picked = self.tracker.pick_highest_priority(&self.project_id).await?;
        let Some(item) = picked else {
            self.state = OrchestratorState::Terminated;
            return Ok(StepOutcome::Terminated {
                reason: "no todo item remains".to_string(),
            });
        };

        debug!(item_id = %item.id, iteration = self.iteration, "selected item for session");
        Ok(StepOutcome::RunSession { item_id: item.id, kind: self.session_kind })
    }

    /// Record the result of the iteration just run: whether the driver's
    /// output matched a stop phrase, or returned a fatal error, and advance
    /// toward `sleeping` or `terminated` accordingly.
    pub async fn record_iteration_result(
        &mut self,
        driver_output: &str,
        fatal_error: bool,
    ) -> Result<(), OrchestratorError> {
        self.iteration += 1;

        if fatal_error {
            self.state = OrchestratorState::Terminated;
            warn!("driver returned a fatal error, terminating orchestrator");
            return Ok(());
        }

        if self.matches_stop_phrase(driver_output) {
            self.state = OrchestratorState::Terminated;
            info!("driver output matched a stop phrase, terminating orchestrator");
            return Ok(());
        }

        let remaining = self
            .tracker
            .list_items(&self.project_id, ItemFilter { status: Some(WorkItemStatus::Todo), priority: None })
            .await?;
        if remaining.is_empty() {
            self.state = OrchestratorState::Terminated;
            return Ok(());
        }

        self.state = OrchestratorState::Sleeping;
        Ok(())
    }

    fn matches_stop_phrase(&self, driver_output: &str) -> bool {
        let lower = driver_output.to_lowercase();
        self.config.stop_phrases.iter().any(|phrase| lower.contains(&phrase.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::MockTrackerClient;

    const SPEC: &str = r#"
project_name = "demo"
overview = "a web dashboard"
technology_stack = ["typescript"]

[[features]]
title = "add login"
description = "d"
priority = 1
category = "frontend"
test_steps = "s"
"#;

    #[tokio::test]
    async fn init_creates_project_and_items_then_runs_coding() {
        let tracker: Arc<dyn TrackerClient> = Arc::new(MockTrackerClient::new());
        let (mut orchestrator, _spec) =
            SessionOrchestrator::init(tracker, SPEC, OrchestratorConfig::default(), None, false).await.unwrap();
        assert_eq!(orchestrator.state(), OrchestratorState::Initializing);

        let outcome = orchestrator.step().await.unwrap();
        assert!(matches!(outcome, StepOutcome::RunSession { .. }));
        assert_eq!(orchestrator.state(), OrchestratorState::Coding);
    }

    #[tokio::test]
    async fn terminates_when_no_todo_items_remain() {
        let tracker: Arc<dyn TrackerClient> = Arc::new(MockTrackerClient::new());
        let (mut orchestrator, _spec) =
            SessionOrchestrator::init(tracker.clone(), SPEC, OrchestratorConfig::default(), None, false)
                .await
                .unwrap();
        let StepOutcome::RunSession { item_id, .. } = orchestrator.step().await.unwrap() else {
            panic!("expected RunSession");
        };
        tracker.set_status(item_id, WorkItemStatus::Done).await.unwrap();
        orchestrator.record_iteration_result("done", false).await.unwrap();
        assert_eq!(orchestrator.state(), OrchestratorState::Terminated);
    }

    #[tokio::test]
    async fn terminates_on_stop_phrase() {
        let tracker: Arc<dyn TrackerClient> = Arc::new(MockTrackerClient::new());
        let (mut orchestrator, _spec) =
            SessionOrchestrator::init(tracker, SPEC, OrchestratorConfig::default(), None, false).await.unwrap();
        orchestrator.step().await.unwrap();
        orchestrator.record_iteration_result("All features complete: feature-complete", false).await.unwrap();
        assert_eq!(orchestrator.state(), OrchestratorState::Terminated);
    }

    #[tokio::test]
    async fn rejects_init_on_already_initialized_project_without_extend_flag() {
        let tracker: Arc<dyn TrackerClient> = Arc::new(MockTrackerClient::new());
        let marker = ProjectMarker {
            project_id: "p1".to_string(),
            total_items: 1,
            meta_item_id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
        };
        let err =
            SessionOrchestrator::init(tracker, SPEC, OrchestratorConfig::default(), Some(marker), false)
                .await
                .unwrap_err();
        assert!(matches!(err, OrchestratorError::AlreadyInitialized));
    }
}
