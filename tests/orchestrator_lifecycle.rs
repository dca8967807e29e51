//! Scenarios 1-3 from the end-to-end testable properties: init-from-scratch,
//! session completion, and extension mode.

use std::sync::Arc;

use rag_agent::domain::WorkItemStatus;
use rag_agent::orchestrator::{OrchestratorConfig, SessionOrchestrator, StepOutcome};
use rag_agent::tracker::{ItemFilter, MockTrackerClient, TrackerClient};

const SPEC_ABC: &str = r#"
project_name = "demo"
overview = "a small CLI tool"
technology_stack = ["rust"]

[[features]]
title = "A"
description = "first feature"
priority = 2
category = "backend"
test_steps = "run cargo test"

[[features]]
title = "B"
description = "second feature"
priority = 1
category = "backend"
test_steps = "run cargo test"

[[features]]
title = "C"
description = "third feature"
priority = 3
category = "backend"
test_steps = "run cargo test"
"#;

const SPEC_DE: &str = r#"
project_name = "demo"
overview = "extension spec"
technology_stack = ["rust"]

[[features]]
title = "D"
description = "fourth feature"
priority = 1
category = "backend"
test_steps = "run cargo test"

[[features]]
title = "E"
description = "fifth feature"
priority = 1
category = "backend"
test_steps = "run cargo test"
"#;

#[tokio::test]
async fn init_from_scratch_creates_project_with_three_items_and_picks_lowest_priority() {
    let tracker: Arc<dyn TrackerClient> = Arc::new(MockTrackerClient::new());
    let (orchestrator, spec) =
        SessionOrchestrator::init(tracker.clone(), SPEC_ABC, OrchestratorConfig::default(), None, false)
            .await
            .unwrap();

    assert_eq!(spec.features.len(), 3);

    let items = tracker.list_items(orchestrator.project_id(), ItemFilter::default()).await.unwrap();
    assert_eq!(items.len(), 3);

    let picked = tracker.pick_highest_priority(orchestrator.project_id()).await.unwrap().unwrap();
    assert_eq!(picked.title, "B");
    assert_eq!(picked.priority, 1);
}

#[tokio::test]
async fn session_completion_transitions_exactly_one_item_and_leaves_others_todo() {
    let tracker: Arc<dyn TrackerClient> = Arc::new(MockTrackerClient::new());
    let (mut orchestrator, _spec) =
        SessionOrchestrator::init(tracker.clone(), SPEC_ABC, OrchestratorConfig::default(), None, false)
            .await
            .unwrap();

    let outcome = orchestrator.step().await.unwrap();
    let item_id = match outcome {
        StepOutcome::RunSession { item_id, .. } => item_id,
        other => panic!("expected RunSession, got {other:?}"),
    };

    tracker.set_status(item_id, WorkItemStatus::Done).await.unwrap();
    tracker.append_comment(item_id, "implemented the login form and ran the suite").await.unwrap();

    orchestrator.record_iteration_result("completed", false).await.unwrap();

    let items = tracker.list_items(orchestrator.project_id(), ItemFilter::default()).await.unwrap();
    let done: Vec<_> = items.iter().filter(|i| i.status == WorkItemStatus::Done).collect();
    let todo: Vec<_> = items.iter().filter(|i| i.status == WorkItemStatus::Todo).collect();

    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, item_id);
    assert_eq!(done[0].comments.len(), 1);
    assert_eq!(todo.len(), 2);
}

#[tokio::test]
async fn extension_mode_adds_features_to_existing_project_without_duplicating_it() {
    let tracker: Arc<dyn TrackerClient> = Arc::new(MockTrackerClient::new());
    let (orchestrator, _spec) =
        SessionOrchestrator::init(tracker.clone(), SPEC_ABC, OrchestratorConfig::default(), None, false)
            .await
            .unwrap();

    let marker = rag_agent::domain::ProjectMarker {
        project_id: orchestrator.project_id().to_string(),
        total_items: 3,
        meta_item_id: uuid::Uuid::new_v4(),
        created_at: chrono::Utc::now(),
    };

    let (extended, spec) =
        SessionOrchestrator::init(tracker.clone(), SPEC_DE, OrchestratorConfig::default(), Some(marker.clone()), true)
            .await
            .unwrap();

    assert_eq!(extended.project_id(), marker.project_id);
    assert_eq!(spec.features.len(), 2);

    let items = tracker.list_items(extended.project_id(), ItemFilter::default()).await.unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles.len(), 5);
    for expected in ["A", "B", "C", "D", "E"] {
        assert!(titles.contains(&expected), "missing {expected} in {titles:?}");
    }
}

#[tokio::test]
async fn reinitializing_without_extend_is_rejected() {
    let tracker: Arc<dyn TrackerClient> = Arc::new(MockTrackerClient::new());
    let (orchestrator, _spec) =
        SessionOrchestrator::init(tracker.clone(), SPEC_ABC, OrchestratorConfig::default(), None, false)
            .await
            .unwrap();

    let marker = rag_agent::domain::ProjectMarker {
        project_id: orchestrator.project_id().to_string(),
        total_items: 3,
        meta_item_id: uuid::Uuid::new_v4(),
        created_at: chrono::Utc::now(),
    };

    let result = SessionOrchestrator::init(tracker, SPEC_ABC, OrchestratorConfig::default(), Some(marker), false).await;
    assert!(result.is_err());
}
