//! In-memory `VectorStore` test double. Scores by naive token overlap
//! rather than real embeddings -- enough to exercise batching, validation,
//! and filter composition in unit tests without a live vector database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::{Chunk, Summary};
use crate::ingest::metadata::DocumentMetadata;

use super::{
    chunk_batch_size, mean_char_len, summary_batch_size, validate_chunk, validate_document_metadata, Collection,
    IngestReport, SearchHit, SearchQuery, StoreError, VectorStore,
};

struct DocumentRecord {
    pages: u32,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<String, DocumentRecord>,
    chunks: Vec<Chunk>,
    summaries: Vec<Summary>,
}

#[derive(Default)]
pub struct InMemoryVectorStore {
    inner: Mutex<Inner>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn overlap_score(query: &str, text: &str) -> f32 {
        let query_words: Vec<String> = query.to_lowercase().split_whitespace().map(str::to_string).collect();
        if query_words.is_empty() {
            return 0.0;
        }
        let text_lower = text.to_lowercase();
        let hits = query_words.iter().filter(|w| text_lower.contains(w.as_str())).count();
        hits as f32 / query_words.len() as f32
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ingest_document(
        &self,
        doc_name: &str,
        chunks: Vec<Chunk>,
        summaries: Vec<Summary>,
        metadata: &DocumentMetadata,
        _toc: Value,
        _hierarchy: Value,
        pages: u32,
    ) -> Result<IngestReport, StoreError> {
        validate_document_metadata(doc_name, metadata)?;
        for (index, chunk) in chunks.iter().enumerate() {
            validate_chunk(doc_name, index, chunk)?;
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.documents.contains_key(doc_name) {
            return Err(StoreError::DuplicateSourceId(doc_name.to_string()));
        }

        let chunk_batch = chunk_batch_size(mean_char_len(chunks.iter().map(|c| c.text.chars().count())));
        let summary_batch = summary_batch_size(mean_char_len(summaries.iter().map(|s| s.text.chars().count())));

        let mut report = IngestReport::default();
        for (batch_index, batch) in chunks.chunks(chunk_batch.max(1)).enumerate() {
            inner.chunks.extend_from_slice(batch);
            report.inserted += batch.len() as u32;
            let _ = batch_index;
        }
        for batch in summaries.chunks(summary_batch.max(1)) {
            inner.summaries.extend_from_slice(batch);
            report.inserted += batch.len() as u32;
        }

        inner.documents.insert(doc_name.to_string(), DocumentRecord { pages });
        Ok(report)
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut hits: Vec<SearchHit> = match query.collection {
            Collection::Chunk => inner
                .chunks
                .iter()
                .filter(|chunk| {
                    query.filter.language.as_deref().is_none_or(|lang| chunk.language == lang)
                        && query.filter.unit_type.is_none_or(|ut| chunk.unit_type == ut)
                        && query
                            .filter
                            .section_path_prefix
                            .as_deref()
                            .is_none_or(|prefix| crate::domain::section_path_starts_with(&chunk.section_path, prefix))
                })
                .map(|chunk| SearchHit {
                    score: Self::overlap_score(&query.query_text, &chunk.text),
                    text: chunk.text.clone(),
                    metadata: json!({
                        "section_path": chunk.section_path,
                        "work": chunk.work,
                        "document": chunk.document,
                    }),
                })
                .collect(),
            Collection::Summary => inner
                .summaries
                .iter()
                .filter(|summary| query.filter.max_level.is_none_or(|max| summary.level <= max))
                .map(|summary| SearchHit {
                    score: Self::overlap_score(&query.query_text, &summary.text),
                    text: summary.text.clone(),
                    metadata: json!({
                        "section_path": summary.section_path,
                        "concepts": summary.concepts,
                        "chunks_count": summary.chunks_count,
                    }),
                })
                .collect(),
            Collection::Work | Collection::Document => Vec::new(),
        };
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn delete_document(&self, source_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.chunks.retain(|c| c.document.source_id != source_id);
        inner.summaries.retain(|s| s.document.source_id != source_id);
        inner.documents.remove(source_id);
        Ok(())
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(match collection {
            Collection::Chunk => inner.chunks.len() as u64,
            Collection::Summary => inner.summaries.len() as u64,
            Collection::Document => inner.documents.len() as u64,
            Collection::Work => inner.documents.len() as u64,
        })
    }

    async fn verify_consistency(&self, source_id: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        if !inner.documents.contains_key(source_id) {
            return Ok(inner.chunks.iter().all(|c| c.document.source_id != source_id)
                && inner.summaries.iter().all(|s| s.document.source_id != source_id));
        }
        Ok(true)
    }
}
