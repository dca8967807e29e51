//! Tracker Adapter: the external issue tracker is an out-of-scope
//! collaborator. This module defines the `TrackerClient` contract and ships
//! an HTTP adapter plus an in-memory mock for tests and `--tracker mock`
//! dry-runs.

mod http;
mod mock;
mod retry;

pub use http::HttpTrackerClient;
pub use mock::MockTrackerClient;
pub use retry::TrackerRetryConfig;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{WorkItem, WorkItemId, WorkItemStatus};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker request failed transiently: {0}")]
    Transient(String),
    #[error("tracker request failed: {0}")]
    Fatal(String),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("work item not found: {0}")]
    ItemNotFound(WorkItemId),
    #[error("retry attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Filter applied to `list_items`. `None` fields are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub status: Option<WorkItemStatus>,
    pub priority: Option<u8>,
}

/// The six tracker operations the orchestrator and driver depend on. An
/// out-of-process tracker is assumed to be the system of record: no
/// operation here caches state beyond what is needed to issue the next
/// request.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    async fn create_project(&self, name: &str, description: &str) -> Result<String, TrackerError>;

    async fn create_item(&self, project_id: &str, item: WorkItem) -> Result<WorkItemId, TrackerError>;

    async fn list_items(&self, project_id: &str, filter: ItemFilter) -> Result<Vec<WorkItem>, TrackerError>;

    /// Minimum `priority` integer among `status = todo`; ties broken by
    /// creation order.
    async fn pick_highest_priority(&self, project_id: &str) -> Result<Option<WorkItem>, TrackerError>;

    async fn set_status(&self, item_id: WorkItemId, status: WorkItemStatus) -> Result<(), TrackerError>;

    async fn append_comment(&self, item_id: WorkItemId, body: &str) -> Result<(), TrackerError>;
}

/// Pick the lowest-priority-number `todo` item, breaking ties by
/// `created_at`. Shared by every `TrackerClient` implementation so the
/// selection rule cannot drift between them.
pub(crate) fn pick_highest_priority_from(items: &[WorkItem]) -> Option<WorkItem> {
    items
        .iter()
        .filter(|item| item.status == WorkItemStatus::Todo)
        .min_by(|a, b| a.priority.cmp(&b.priority).then(a.created_at.cmp(&b.created_at)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WorkItem;

    #[test]
    fn picks_lowest_priority_number_breaking_ties_by_creation_order() {
        let mut first = WorkItem::new("a".into(), "d".into(), 2, "cat".into(), "steps".into());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = WorkItem::new("b".into(), "d".into(), 2, "cat".into(), "steps".into());
        let mut urgent = WorkItem::new("c".into(), "d".into(), 1, "cat".into(), "steps".into());
        urgent.set_status(WorkItemStatus::Done);
        first.set_status(WorkItemStatus::Todo);

        let picked = pick_highest_priority_from(&[first.clone(), second.clone(), urgent]);
        assert_eq!(picked.unwrap().id, first.id);
    }

    #[test]
    fn returns_none_when_no_todo_items() {
        let mut item = WorkItem::new("a".into(), "d".into(), 1, "cat".into(), "steps".into());
        item.set_status(WorkItemStatus::Done);
        assert!(pick_highest_priority_from(&[item]).is_none());
    }
}
