//! `reqwest`-based `TrackerClient`, grounded on the teacher's HTTP
//! dependency of choice (`reqwest` with `rustls-tls`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{WorkItem, WorkItemId, WorkItemStatus};

use super::{ItemFilter, TrackerClient, TrackerError, TrackerRetryConfig};

pub struct HttpTrackerClient {
    base_url: url::Url,
    client: reqwest::Client,
    retry: TrackerRetryConfig,
}

impl HttpTrackerClient {
    pub fn new(base_url: url::Url) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
            retry: TrackerRetryConfig::default(),
        }
    }

    pub fn with_retry_config(mut self, retry: TrackerRetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn classify_status(status: reqwest::StatusCode, message: String) -> TrackerError {
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            TrackerError::Transient(message)
        } else {
            TrackerError::Fatal(message)
        }
    }
}

#[derive(Serialize)]
struct CreateProjectRequest<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
struct CreateProjectResponse {
    project_id: String,
}

#[derive(Deserialize)]
struct ListItemsResponse {
    items: Vec<WorkItem>,
}

#[derive(Serialize)]
struct SetStatusRequest {
    status: WorkItemStatus,
}

#[derive(Serialize)]
struct AppendCommentRequest<'a> {
    body: &'a str,
}

#[async_trait]
impl TrackerClient for HttpTrackerClient {
    async fn create_project(&self, name: &str, description: &str) -> Result<String, TrackerError> {
        self.retry
            .run(|| async {
                let response = self
                    .client
                    .post(self.base_url.join("projects").unwrap())
                    .json(&CreateProjectRequest { name, description })
                    .send()
                    .await
                    .map_err(|e| TrackerError::Transient(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, body));
                }
                let parsed: CreateProjectResponse =
                    response.json().await.map_err(|e| TrackerError::Fatal(e.to_string()))?;
                Ok(parsed.project_id)
            })
            .await
    }

    async fn create_item(&self, project_id: &str, item: WorkItem) -> Result<WorkItemId, TrackerError> {
        self.retry
            .run(|| async {
                let url = self
                    .base_url
                    .join(&format!("projects/{project_id}/items"))
                    .map_err(|e| TrackerError::Fatal(e.to_string()))?;
                let response = self
                    .client
                    .post(url)
                    .json(&item)
                    .send()
                    .await
                    .map_err(|e| TrackerError::Transient(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, body));
                }
                Ok(item.id)
            })
            .await
    }

    async fn list_items(&self, project_id: &str, filter: ItemFilter) -> Result<Vec<WorkItem>, TrackerError> {
        self.retry
            .run(|| async {
                let url = self
                    .base_url
                    .join(&format!("projects/{project_id}/items"))
                    .map_err(|e| TrackerError::Fatal(e.to_string()))?;
                let mut request = self.client.get(url);
                if let Some(status) = filter.status {
                    request = request.query(&[("status", format!("{status:?}").to_lowercase())]);
                }
                if let Some(priority) = filter.priority {
                    request = request.query(&[("priority", priority.to_string())]);
                }
                let response = request.send().await.map_err(|e| TrackerError::Transient(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, body));
                }
                let parsed: ListItemsResponse =
                    response.json().await.map_err(|e| TrackerError::Fatal(e.to_string()))?;
                Ok(parsed.items)
            })
            .await
    }

    async fn pick_highest_priority(&self, project_id: &str) -> Result<Option<WorkItem>, TrackerError> {
        let items = self
            .list_items(project_id, ItemFilter { status: Some(WorkItemStatus::Todo), priority: None })
            .await?;
        Ok(super::pick_highest_priority_from(&items))
    }

    async fn set_status(&self, item_id: WorkItemId, status: WorkItemStatus) -> Result<(), TrackerError> {
        self.retry
            .run(|| async {
                let url = self
                    .base_url
                    .join(&format!("items/{item_id}/status"))
                    .map_err(|e| TrackerError::Fatal(e.to_string()))?;
                let response = self
                    .client
                    .patch(url)
                    .json(&SetStatusRequest { status })
                    .send()
                    .await
                    .map_err(|e| TrackerError::Transient(e.to_string()))?;
                let status_code = response.status();
                if !status_code.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status_code, body));
                }
                Ok(())
            })
            .await
    }

    async fn append_comment(&self, item_id: WorkItemId, body: &str) -> Result<(), TrackerError> {
        self.retry
            .run(|| async {
                let url = self
                    .base_url
                    .join(&format!("items/{item_id}/comments"))
                    .map_err(|e| TrackerError::Fatal(e.to_string()))?;
                let response = self
                    .client
                    .post(url)
                    .json(&AppendCommentRequest { body })
                    .send()
                    .await
                    .map_err(|e| TrackerError::Transient(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, text));
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_server_errors_as_transient() {
        assert!(matches!(
            HttpTrackerClient::classify_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            TrackerError::Transient(_)
        ));
        assert!(matches!(
            HttpTrackerClient::classify_status(reqwest::StatusCode::NOT_FOUND, "gone".into()),
            TrackerError::Fatal(_)
        ));
    }
}
