//! Retrieval Engine: four query modes over the Vector Store, grounded
//! structurally on the pack's closest sibling search module -- a shared
//! result type, documented scoring formula, and mode dispatch by name.

use thiserror::Error;

use crate::domain::UnitType;
use crate::store::{Collection, SearchHit, SearchQuery, StoreError, StoreFilter, VectorStore};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RetrievalError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which mode served one `RetrievalEngine` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    Simple,
    Summary,
    Hierarchical,
    Auto,
}

/// Filters accepted by every retrieval mode. `author`/`work`/`min_similarity`
/// are applied in the application layer after scoring; the rest are pushed
/// down to the store query.
#[derive(Debug, Clone, Default)]
pub struct RetrievalFilters {
    pub author: Option<String>,
    pub work: Option<String>,
    pub language: Option<String>,
    pub unit_type: Option<UnitType>,
    pub section_path_prefix: Option<String>,
    pub min_similarity: Option<f32>,
}

impl RetrievalFilters {
    fn store_filter(&self, max_level: Option<u8>) -> StoreFilter {
        StoreFilter {
            language: self.language.clone(),
            unit_type: self.unit_type,
            section_path_prefix: self.section_path_prefix.clone(),
            max_level,
        }
    }

    fn post_filter(&self, hit: &SearchHit) -> bool {
        if let Some(min) = self.min_similarity {
            if hit.score < min {
                return false;
            }
        }
        if let Some(author) = &self.author {
            let matches = hit.metadata.pointer("/work/author").and_then(|v| v.as_str()).is_some_and(|a| a == author);
            if !matches {
                return false;
            }
        }
        if let Some(work) = &self.work {
            let matches = hit.metadata.pointer("/work/title").and_then(|v| v.as_str()).is_some_and(|t| t == work);
            if !matches {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalHit {
    pub score: f32,
    pub text: String,
    pub metadata: serde_json::Value,
    /// Populated only by `hierarchical`: the section title this chunk was
    /// surfaced under.
    pub section: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub mode: RetrievalMode,
    pub hits: Vec<RetrievalHit>,
}

/// Weight given to the chunk-level score in the hierarchical combine
/// formula; the remainder (`1.0 - CHUNK_WEIGHT`) goes to the section score.
const CHUNK_WEIGHT: f32 = 0.7;

/// Minimum token count for a query to be treated as hierarchical by `auto`.
const AUTO_ROUTE_MIN_TOKENS: usize = 4;

const INTERROGATIVE_PREFIXES: &[&str] = &["what", "why", "how", "who", "when", "where", "which", "is", "does", "do", "can"];

/// `true` iff `query` looks interrogative (starts with a question word, or
/// ends in `?`) and has at least `AUTO_ROUTE_MIN_TOKENS` tokens.
pub fn is_hierarchical_query(query: &str) -> bool {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    if tokens.len() < AUTO_ROUTE_MIN_TOKENS {
        return false;
    }
    let starts_interrogative =
        tokens.first().map(|t| t.to_lowercase()).is_some_and(|first| INTERROGATIVE_PREFIXES.contains(&first.as_str()));
    starts_interrogative || query.trim_end().ends_with('?')
}

pub struct RetrievalEngine {
    store: std::sync::Arc<dyn VectorStore>,
}

impl RetrievalEngine {
    pub fn new(store: std::sync::Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub async fn simple(&self, query: &str, limit: usize, filters: &RetrievalFilters) -> Result<RetrievalResult, RetrievalError> {
        let hits = self.query_collection(Collection::Chunk, query, limit, filters, None).await?;
        Ok(RetrievalResult { mode: RetrievalMode::Simple, hits })
    }

    pub async fn summary(&self, query: &str, limit: usize, filters: &RetrievalFilters) -> Result<RetrievalResult, RetrievalError> {
        let hits = self.query_collection(Collection::Summary, query, limit, filters, None).await?;
        Ok(RetrievalResult { mode: RetrievalMode::Summary, hits })
    }

    pub async fn hierarchical(
        &self,
        query: &str,
        sections_limit: usize,
        chunks_per_section: usize,
        filters: &RetrievalFilters,
    ) -> Result<RetrievalResult, RetrievalError> {
        let sections = self.query_collection(Collection::Summary, query, sections_limit, filters, Some(2)).await?;

        let mut combined = Vec::new();
        for section in &sections {
            let section_path = section.metadata.pointer("/section_path").and_then(|v| v.as_str()).unwrap_or_default();
            let mut section_filters = filters.clone();
            section_filters.section_path_prefix = Some(section_path.to_string());

            let chunk_hits = self.query_collection(Collection::Chunk, query, chunks_per_section, &section_filters, None).await?;
            for mut chunk_hit in chunk_hits {
                let combined_score = CHUNK_WEIGHT * chunk_hit.score + (1.0 - CHUNK_WEIGHT) * section.score;
                chunk_hit.score = combined_score;
                chunk_hit.section = Some(section.text.clone());
                combined.push(chunk_hit);
            }
        }

        combined.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        combined.truncate(chunks_per_section.max(sections_limit).max(1) * sections_limit.max(1));
        Ok(RetrievalResult { mode: RetrievalMode::Hierarchical, hits: combined })
    }

    pub async fn auto(&self, query: &str, limit: usize, filters: &RetrievalFilters) -> Result<RetrievalResult, RetrievalError> {
        if limit == 0 {
            return Ok(RetrievalResult { mode: RetrievalMode::Auto, hits: Vec::new() });
        }
        let mut result = if is_hierarchical_query(query) {
            self.hierarchical(query, 3, 5, filters).await?
        } else {
            self.simple(query, limit, filters).await?
        };
        result.hits.truncate(limit);
        result.mode = RetrievalMode::Auto;
        Ok(result)
    }

    async fn query_collection(
        &self,
        collection: Collection,
        query: &str,
        limit: usize,
        filters: &RetrievalFilters,
        max_level: Option<u8>,
    ) -> Result<Vec<RetrievalHit>, RetrievalError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let search_query =
            SearchQuery { collection, query_text: query.to_string(), limit, filter: filters.store_filter(max_level) };
        let hits = self.store.search(search_query).await?;
        Ok(hits
            .into_iter()
            .filter(|hit| filters.post_filter(hit))
            .map(|hit| RetrievalHit { score: hit.score, text: hit.text, metadata: hit.metadata, section: None })
            .collect())
    }
}

/// Stable `{ok, kind, message}` error envelope for surfacing store errors
/// verbatim to callers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub kind: String,
    pub message: String,
}

impl From<&RetrievalError> for ErrorEnvelope {
    fn from(error: &RetrievalError) -> Self {
        let kind = match error {
            RetrievalError::Store(StoreError::Transient(_)) => "transient",
            RetrievalError::Store(StoreError::Fatal(_)) => "fatal",
            RetrievalError::Store(StoreError::Validation { .. }) => "validation",
            RetrievalError::Store(StoreError::DuplicateSourceId(_)) => "duplicate",
            RetrievalError::Store(StoreError::RetriesExhausted { .. }) => "retries_exhausted",
        };
        Self { ok: false, kind: kind.to_string(), message: error.to_string() }
    }
}
