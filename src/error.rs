//! Crate-wide error taxonomy.
//!
//! Each component defines a local error enum for the failures specific to it;
//! those convert into [`AppError`] via `#[from]` at the points where control
//! returns to an orchestrator. Call sites propagate with `?` and reach for
//! `anyhow::Context` when a human-readable wrapper is useful; nothing here is
//! ever swallowed silently.

use std::path::PathBuf;
use thiserror::Error;

use crate::driver::DriverError;
use crate::ingest::pipeline::PipelineError;
use crate::retrieval::RetrievalError;
use crate::sandbox::SandboxError;
use crate::store::StoreError;
use crate::tracker::TrackerError;

/// Top-level error taxonomy, matching the kinds in the error-handling design.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A tool call violated the sandbox policy.
    #[error("sandbox denied tool call: {0}")]
    SandboxDeny(#[from] SandboxError),

    /// Timeout or 5xx from an external service, retried before surfacing.
    #[error("remote service unavailable: {0}")]
    RemoteTransient(String),

    /// 4xx or persistent remote failure after retries exhausted.
    #[error("remote request failed: {0}")]
    RemoteFatal(String),

    /// An LLM response failed strict JSON parsing, even after one repair retry.
    #[error("schema error in {stage}: {message}")]
    Schema { stage: String, message: String },

    /// A metadata or nested-object invariant was violated before any write.
    #[error("validation error on field `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Requested item/project/document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Cooperative cancellation between stages or iterations.
    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }
}
