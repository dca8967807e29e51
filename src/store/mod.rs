//! Vector Store Adapter: the boundary between the ingestion pipeline and
//! the corpus's semantic index. Defines the `VectorStore` trait and leaves
//! the concrete vector database an out-of-scope collaborator, mirroring the
//! teacher's "one trait, one real adapter, one in-memory test double" shape
//! used for `LLMProvider`.

mod http;
mod memory;

pub use http::HttpVectorStore;
pub use memory::InMemoryVectorStore;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::domain::{Chunk, Summary, UnitType};
use crate::ingest::metadata::DocumentMetadata;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("validation error on field `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("document `{0}` already exists; delete it first")]
    DuplicateSourceId(String),

    #[error("store request failed transiently: {0}")]
    Transient(String),

    #[error("store request failed: {0}")]
    Fatal(String),

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Which collection a query or count targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Chunk,
    Summary,
    Work,
    Document,
}

/// Filters applicable at the store-query layer (author/work and
/// min_similarity are post-filtered by the retrieval engine instead).
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub language: Option<String>,
    pub unit_type: Option<UnitType>,
    pub section_path_prefix: Option<String>,
    /// `Summary`-collection queries only: restricts hits to `level <= max_level`.
    /// `None` searches every level. Ignored by other collections.
    pub max_level: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub collection: Collection,
    pub query_text: String,
    pub limit: usize,
    pub filter: StoreFilter,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub score: f32,
    pub text: String,
    pub metadata: Value,
}

/// Result of one `ingest_document` call's batched writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: u32,
    pub failed: u32,
    pub failed_indices: Vec<u32>,
}

/// One vector-database backend. `ingest_document` validates metadata and
/// every chunk/summary's nested-object fields before any write, batches
/// inserts adaptively by mean unit length, and retries each batch
/// independently so one failing batch doesn't roll back its siblings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn ingest_document(
        &self,
        doc_name: &str,
        chunks: Vec<Chunk>,
        summaries: Vec<Summary>,
        metadata: &DocumentMetadata,
        toc: Value,
        hierarchy: Value,
        pages: u32,
    ) -> Result<IngestReport, StoreError>;

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, StoreError>;

    /// Removes Document, Chunks, and Summaries with this `source_id`. The
    /// owning Work is preserved unless the caller separately requests its
    /// removal.
    async fn delete_document(&self, source_id: &str) -> Result<(), StoreError>;

    async fn count(&self, collection: Collection) -> Result<u64, StoreError>;

    /// `true` iff every Chunk/Summary with this `source_id` actually points
    /// at an existing Document -- a consistency check, not a repair.
    async fn verify_consistency(&self, source_id: &str) -> Result<bool, StoreError>;
}

/// Validates the metadata fields that must be non-empty/non-whitespace
/// before any write for a document ingest.
pub fn validate_document_metadata(doc_name: &str, metadata: &DocumentMetadata) -> Result<(), StoreError> {
    if doc_name.trim().is_empty() {
        return Err(StoreError::Validation { field: "doc_name".into(), message: "must not be empty".into() });
    }
    if metadata.title.trim().is_empty() {
        return Err(StoreError::Validation { field: "title".into(), message: "must not be empty".into() });
    }
    if metadata.author.trim().is_empty() {
        return Err(StoreError::Validation { field: "author".into(), message: "must not be empty".into() });
    }
    if metadata.language.trim().is_empty() {
        return Err(StoreError::Validation { field: "language".into(), message: "must not be empty".into() });
    }
    Ok(())
}

/// Validates the nested-object fields every chunk must carry, naming the
/// failing index and `doc_name` in the error per the ingestion contract.
pub fn validate_chunk(doc_name: &str, index: usize, chunk: &Chunk) -> Result<(), StoreError> {
    if chunk.work.title.trim().is_empty() {
        return Err(StoreError::Validation {
            field: format!("chunks[{index}].work.title"),
            message: format!("must not be empty (doc_name = {doc_name})"),
        });
    }
    if chunk.work.author.trim().is_empty() {
        return Err(StoreError::Validation {
            field: format!("chunks[{index}].work.author"),
            message: format!("must not be empty (doc_name = {doc_name})"),
        });
    }
    if chunk.document.source_id.trim().is_empty() {
        return Err(StoreError::Validation {
            field: format!("chunks[{index}].document.source_id"),
            message: format!("must not be empty (doc_name = {doc_name})"),
        });
    }
    Ok(())
}

/// Adaptive batch size for Chunk inserts, by mean chunk character length.
pub fn chunk_batch_size(mean_chars: f64) -> usize {
    if mean_chars > 50_000.0 {
        10
    } else if mean_chars > 10_000.0 {
        25
    } else if mean_chars > 3_000.0 {
        50
    } else {
        100
    }
}

/// Adaptive batch size for Summary inserts, by mean summary character length.
pub fn summary_batch_size(mean_chars: f64) -> usize {
    if mean_chars > 2_000.0 {
        25
    } else if mean_chars > 500.0 {
        50
    } else {
        75
    }
}

pub(crate) fn mean_char_len<I: IntoIterator<Item = usize>>(lengths: I) -> f64 {
    let lengths: Vec<usize> = lengths.into_iter().collect();
    if lengths.is_empty() {
        return 0.0;
    }
    lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
}

#[derive(Debug, Clone)]
pub(crate) struct StoreRetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for StoreRetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(250), max_delay: Duration::from_secs(10), backoff_multiplier: 2.0 }
    }
}

impl StoreRetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(scaled as u64).min(self.max_delay)
    }

    pub(crate) async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let mut last_error = None;
        for attempt in 0..self.max_attempts.max(1) {
            match op().await {
                Ok(value) => return Ok(value),
                Err(StoreError::Transient(message)) => {
                    warn!(attempt, %message, "store batch write failed transiently, retrying");
                    last_error = Some(message);
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(self.delay_for(attempt)).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Err(StoreError::RetriesExhausted { attempts: self.max_attempts, last_error: last_error.unwrap_or_default() })
    }
}
