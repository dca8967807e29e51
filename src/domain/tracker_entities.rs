use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tracked work item.
pub type WorkItemId = Uuid;

/// Unique identifier for an ephemeral agent session.
pub type SessionId = Uuid;

/// Status of a tracked work item. Transitions are strictly ordered:
/// `Todo -> InProgress -> Done | Blocked`, with `Blocked -> Todo` the only
/// permitted retry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Todo,
    InProgress,
    Done,
    Blocked,
}

/// A comment appended to a work item by the agent driver, recording what
/// changed and any tests run, or the reason a session failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItemComment {
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// One `<feature_N>` descriptor materialised as a tracked work item, or the
/// single meta item used for cross-session narration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub title: String,
    pub description: String,
    /// 1 = urgent .. 4 = low.
    pub priority: u8,
    pub category: String,
    pub test_steps: String,
    pub status: WorkItemStatus,
    pub comments: Vec<WorkItemComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ambient audit trail: which sessions touched this item and with what
    /// resulting status, the natural analogue of a `Task`'s execution
    /// history. Not consulted for scheduling decisions -- the tracker's
    /// `status` field remains the single source of truth for those.
    pub execution_history: Vec<SessionTouch>,
}

impl WorkItem {
    pub fn new(title: String, description: String, priority: u8, category: String, test_steps: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            priority,
            category,
            test_steps,
            status: WorkItemStatus::Todo,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            execution_history: Vec::new(),
        }
    }

    pub fn set_status(&mut self, status: WorkItemStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn append_comment(&mut self, body: impl Into<String>) {
        self.comments.push(WorkItemComment {
            body: body.into(),
            created_at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    pub fn record_touch(&mut self, touch: SessionTouch) {
        self.execution_history.push(touch);
    }
}

/// A single session's effect on a work item, appended to its execution
/// history for operator visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTouch {
    pub session_index: u64,
    pub resulting_status: WorkItemStatus,
    pub at: DateTime<Utc>,
}

/// On-disk idempotency key for "project initialised". Presence disables
/// re-init; once written it is treated as read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectMarker {
    pub project_id: String,
    pub total_items: u32,
    pub meta_item_id: WorkItemId,
    pub created_at: DateTime<Utc>,
}

/// Which coding prompt family a session runs: a library project (tests via
/// type-checker and unit-test runner, no browser automation) or a web
/// project (browser automation available for UI tests).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Init,
    InitBis,
    Library,
    Web,
}

/// Ephemeral record of one iteration of the outer session loop. Not
/// consulted for inter-session handoff -- only written for audit/log
/// purposes, per the "tracker is the source of truth" design note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub session_index: u64,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub stop_reason: Option<String>,
}

impl Session {
    pub fn start(session_index: u64, kind: SessionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_index,
            kind,
            started_at: Utc::now(),
            ended_at: None,
            tokens_in: 0,
            tokens_out: 0,
            stop_reason: None,
        }
    }

    pub fn finish(&mut self, stop_reason: Option<String>) {
        self.ended_at = Some(Utc::now());
        self.stop_reason = stop_reason;
    }
}
