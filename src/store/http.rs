//! `reqwest`-based `VectorStore` targeting an HTTP vector database reachable
//! at `vector_store_url` (default `http://localhost:8080`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use async_trait::async_trait;

use crate::domain::{Chunk, Summary};
use crate::ingest::metadata::DocumentMetadata;

use super::{
    chunk_batch_size, mean_char_len, summary_batch_size, validate_chunk, validate_document_metadata, Collection,
    IngestReport, SearchHit, SearchQuery, StoreError, StoreRetryConfig, VectorStore,
};

pub struct HttpVectorStore {
    base_url: url::Url,
    client: reqwest::Client,
    retry: StoreRetryConfig,
}

impl HttpVectorStore {
    pub fn new(base_url: url::Url) -> Self {
        Self { base_url, client: reqwest::Client::new(), retry: StoreRetryConfig::default() }
    }

    fn classify_status(status: reqwest::StatusCode, message: String) -> StoreError {
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            StoreError::Transient(message)
        } else {
            StoreError::Fatal(message)
        }
    }
}

#[derive(Serialize)]
struct IngestBatchRequest<'a> {
    doc_name: &'a str,
    chunks: &'a [Chunk],
    summaries: &'a [Summary],
}

#[derive(Serialize)]
struct CreateDocumentRequest<'a> {
    doc_name: &'a str,
    metadata: &'a DocumentMetadata,
    toc: &'a Value,
    hierarchy: &'a Value,
    pages: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHitDto>,
}

#[derive(Deserialize)]
struct SearchHitDto {
    score: f32,
    text: String,
    metadata: Value,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Deserialize)]
struct ConsistencyResponse {
    consistent: bool,
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn ingest_document(
        &self,
        doc_name: &str,
        chunks: Vec<Chunk>,
        summaries: Vec<Summary>,
        metadata: &DocumentMetadata,
        toc: Value,
        hierarchy: Value,
        pages: u32,
    ) -> Result<IngestReport, StoreError> {
        validate_document_metadata(doc_name, metadata)?;
        for (index, chunk) in chunks.iter().enumerate() {
            validate_chunk(doc_name, index, chunk)?;
        }

        let create_url =
            self.base_url.join("documents").map_err(|e| StoreError::Fatal(e.to_string()))?;
        let response = self
            .client
            .post(create_url)
            .json(&CreateDocumentRequest { doc_name, metadata, toc: &toc, hierarchy: &hierarchy, pages })
            .send()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT {
            return Err(StoreError::DuplicateSourceId(doc_name.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        let chunk_batch = chunk_batch_size(mean_char_len(chunks.iter().map(|c| c.text.chars().count())));
        let summary_batch = summary_batch_size(mean_char_len(summaries.iter().map(|s| s.text.chars().count())));

        let mut report = IngestReport::default();
        for (batch_index, batch) in chunks.chunks(chunk_batch.max(1)).enumerate() {
            match self.ingest_batch(doc_name, batch, &[]).await {
                Ok(()) => report.inserted += batch.len() as u32,
                Err(_) => {
                    report.failed += batch.len() as u32;
                    let start = batch_index * chunk_batch;
                    report.failed_indices.extend((start..start + batch.len()).map(|i| i as u32));
                }
            }
        }
        for batch in summaries.chunks(summary_batch.max(1)) {
            match self.ingest_batch(doc_name, &[], batch).await {
                Ok(()) => report.inserted += batch.len() as u32,
                Err(_) => report.failed += batch.len() as u32,
            }
        }

        Ok(report)
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchHit>, StoreError> {
        self.retry
            .run(|| async {
                let url = self.base_url.join("search").map_err(|e| StoreError::Fatal(e.to_string()))?;
                let response = self
                    .client
                    .post(url)
                    .json(&serde_json::json!({
                        "collection": format!("{:?}", query.collection).to_lowercase(),
                        "query_text": query.query_text,
                        "limit": query.limit,
                        "language": query.filter.language,
                        "unit_type": query.filter.unit_type,
                        "section_path_prefix": query.filter.section_path_prefix,
                        "max_level": query.filter.max_level,
                    }))
                    .send()
                    .await
                    .map_err(|e| StoreError::Transient(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, body));
                }
                let parsed: SearchResponse = response.json().await.map_err(|e| StoreError::Fatal(e.to_string()))?;
                Ok(parsed.hits.into_iter().map(|h| SearchHit { score: h.score, text: h.text, metadata: h.metadata }).collect())
            })
            .await
    }

    async fn delete_document(&self, source_id: &str) -> Result<(), StoreError> {
        self.retry
            .run(|| async {
                let url = self
                    .base_url
                    .join(&format!("documents/{source_id}"))
                    .map_err(|e| StoreError::Fatal(e.to_string()))?;
                let response = self.client.delete(url).send().await.map_err(|e| StoreError::Transient(e.to_string()))?;
                let status = response.status();
                if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, body));
                }
                Ok(())
            })
            .await
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        self.retry
            .run(|| async {
                let name = format!("{collection:?}").to_lowercase();
                let url = self.base_url.join(&format!("collections/{name}/count")).map_err(|e| StoreError::Fatal(e.to_string()))?;
                let response = self.client.get(url).send().await.map_err(|e| StoreError::Transient(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, body));
                }
                let parsed: CountResponse = response.json().await.map_err(|e| StoreError::Fatal(e.to_string()))?;
                Ok(parsed.count)
            })
            .await
    }

    async fn verify_consistency(&self, source_id: &str) -> Result<bool, StoreError> {
        self.retry
            .run(|| async {
                let url = self
                    .base_url
                    .join(&format!("documents/{source_id}/verify"))
                    .map_err(|e| StoreError::Fatal(e.to_string()))?;
                let response = self.client.get(url).send().await.map_err(|e| StoreError::Transient(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, body));
                }
                let parsed: ConsistencyResponse = response.json().await.map_err(|e| StoreError::Fatal(e.to_string()))?;
                Ok(parsed.consistent)
            })
            .await
    }
}

impl HttpVectorStore {
    async fn ingest_batch(&self, doc_name: &str, chunks: &[Chunk], summaries: &[Summary]) -> Result<(), StoreError> {
        self.retry
            .run(|| async {
                let url = self.base_url.join("ingest/batch").map_err(|e| StoreError::Fatal(e.to_string()))?;
                let response = self
                    .client
                    .post(url)
                    .json(&IngestBatchRequest { doc_name, chunks, summaries })
                    .send()
                    .await
                    .map_err(|e| StoreError::Transient(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Self::classify_status(status, body));
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
            HttpVectorStore::classify_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, "down".into()),
            StoreError::Transient(_)
        ));
        assert!(matches!(
            HttpVectorStore::classify_status(reqwest::StatusCode::BAD_REQUEST, "bad".into()),
            StoreError::Fatal(_)
        ));
    }
}
