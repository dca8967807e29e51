//! In-memory `TrackerClient`, grounded on the teacher's `Arc<Mutex<..>>`
//! session bookkeeping pattern. Used in tests and as the `--tracker mock`
//! CLI mode for local dry-runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{WorkItem, WorkItemId, WorkItemStatus};

use super::{pick_highest_priority_from, ItemFilter, TrackerClient, TrackerError};

#[derive(Debug, Default)]
struct Project {
    name: String,
    description: String,
    items: Vec<WorkItem>,
}

#[derive(Debug, Clone, Default)]
pub struct MockTrackerClient {
    projects: Arc<Mutex<HashMap<String, Project>>>,
}

impl MockTrackerClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrackerClient for MockTrackerClient {
    async fn create_project(&self, name: &str, description: &str) -> Result<String, TrackerError> {
        let project_id = Uuid::new_v4().to_string();
        let mut projects = self.projects.lock().await;
        projects.insert(
            project_id.clone(),
            Project {
                name: name.to_string(),
                description: description.to_string(),
                items: Vec::new(),
            },
        );
        Ok(project_id)
    }

    async fn create_item(&self, project_id: &str, item: WorkItem) -> Result<WorkItemId, TrackerError> {
        let mut projects = self.projects.lock().await;
        let project = projects
            .get_mut(project_id)
            .ok_or_else(|| TrackerError::ProjectNotFound(project_id.to_string()))?;
        let id = item.id;
        project.items.push(item);
        Ok(id)
    }

    async fn list_items(&self, project_id: &str, filter: ItemFilter) -> Result<Vec<WorkItem>, TrackerError> {
        let projects = self.projects.lock().await;
        let project = projects
            .get(project_id)
            .ok_or_else(|| TrackerError::ProjectNotFound(project_id.to_string()))?;
        Ok(project
            .items
            .iter()
            .filter(|item| filter.status.is_none_or(|s| item.status == s))
            .filter(|item| filter.priority.is_none_or(|p| item.priority == p))
            .cloned()
            .collect())
    }

    async fn pick_highest_priority(&self, project_id: &str) -> Result<Option<WorkItem>, TrackerError> {
        let projects = self.projects.lock().await;
        let project = projects
            .get(project_id)
            .ok_or_else(|| TrackerError::ProjectNotFound(project_id.to_string()))?;
        Ok(pick_highest_priority_from(&project.items))
    }

    async fn set_status(&self, item_id: WorkItemId, status: WorkItemStatus) -> Result<(), TrackerError> {
        let mut projects = self.projects.lock().await;
        for project in projects.values_mut() {
            if let Some(item) = project.items.iter_mut().find(|i| i.id == item_id) {
                item.set_status(status);
                return Ok(());
            }
        }
        Err(TrackerError::ItemNotFound(item_id))
    }

    async fn append_comment(&self, item_id: WorkItemId, body: &str) -> Result<(), TrackerError> {
        let mut projects = self.projects.lock().await;
        for project in projects.values_mut() {
            if let Some(item) = project.items.iter_mut().find(|i| i.id == item_id) {
                item.append_comment(body);
                return Ok(());
            }
        }
        Err(TrackerError::ItemNotFound(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WorkItem;

    #[tokio::test]
    async fn round_trips_items_through_a_project() {
        let client = MockTrackerClient::new();
        let project_id = client.create_project("demo", "desc").await.unwrap();
        let item = WorkItem::new("feat".into(), "desc".into(), 1, "backend".into(), "steps".into());
        let item_id = client.create_item(&project_id, item).await.unwrap();

        let picked = client.pick_highest_priority(&project_id).await.unwrap().unwrap();
        assert_eq!(picked.id, item_id);

        client.set_status(item_id, WorkItemStatus::InProgress).await.unwrap();
        client.append_comment(item_id, "started work").await.unwrap();

        let items = client
            .list_items(&project_id, ItemFilter { status: Some(WorkItemStatus::InProgress), priority: None })
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].comments.len(), 1);
    }

    #[tokio::test]
    async fn unknown_project_is_an_error() {
        let client = MockTrackerClient::new();
        let err = client.list_items("missing", ItemFilter::default()).await.unwrap_err();
        assert!(matches!(err, TrackerError::ProjectNotFound(_)));
    }
}
