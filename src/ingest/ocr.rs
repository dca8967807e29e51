//! OCR Stage: recognises a PDF into structured pages, persisting the
//! response to a cache file keyed by document stem. The external OCR
//! vendor is an out-of-scope collaborator; this module defines the
//! `OcrProvider` trait and no bundled real vendor implementation.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Provider(String),
    #[error("OCR cache I/O error at {path}: {source}")]
    Cache { path: String, #[source] source: std::io::Error },
    #[error("OCR cache file is corrupt: {0}")]
    CorruptCache(String),
}

/// Options controlling one OCR call.
#[derive(Debug, Clone, Copy, Default)]
pub struct OcrOptions {
    /// Reuse the cache file if present, skipping the external call.
    pub skip_ocr: bool,
    /// Request page/table/figure annotations. Roughly triples cost but
    /// makes downstream TOC extraction more reliable.
    pub use_annotations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableBlock {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub page: u32,
    pub index: u32,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    pub page: u32,
    pub text_blocks: Vec<TextBlock>,
    pub tables: Vec<TableBlock>,
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    pub pages: Vec<OcrPage>,
}

impl OcrResponse {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// One OCR vendor backend. Mirrors the teacher's provider-agnostic
/// `LLMProvider` shape: one trait, swappable backends, unified error type.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize(&self, pdf_path: &Path, options: OcrOptions) -> Result<OcrResponse, OcrError>;
}

/// Recognises `pdf_path`, honouring `skip_ocr` cache reuse: if set and a
/// cache file exists at `cache_path`, the cached response is loaded without
/// calling the provider. Otherwise the provider is called and its response
/// is written to `cache_path` atomically (write-tmp-then-rename).
pub async fn recognize_with_cache(
    provider: &dyn OcrProvider,
    pdf_path: &Path,
    cache_path: &Path,
    options: OcrOptions,
) -> Result<OcrResponse, OcrError> {
    if options.skip_ocr && cache_path.exists() {
        return load_cache(cache_path).await;
    }

    let response = provider.recognize(pdf_path, options).await?;
    write_cache(cache_path, &response).await?;
    Ok(response)
}

async fn load_cache(cache_path: &Path) -> Result<OcrResponse, OcrError> {
    let raw = tokio::fs::read_to_string(cache_path)
        .await
        .map_err(|e| OcrError::Cache { path: cache_path.display().to_string(), source: e })?;
    serde_json::from_str(&raw).map_err(|e| OcrError::CorruptCache(e.to_string()))
}

async fn write_cache(cache_path: &Path, response: &OcrResponse) -> Result<(), OcrError> {
    if let Some(parent) = cache_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| OcrError::Cache { path: parent.display().to_string(), source: e })?;
    }
    let tmp_path = cache_path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(response).map_err(|e| OcrError::CorruptCache(e.to_string()))?;
    tokio::fs::write(&tmp_path, &body)
        .await
        .map_err(|e| OcrError::Cache { path: tmp_path.display().to_string(), source: e })?;
    tokio::fs::rename(&tmp_path, cache_path)
        .await
        .map_err(|e| OcrError::Cache { path: cache_path.display().to_string(), source: e })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl OcrProvider for CountingProvider {
        async fn recognize(&self, _pdf_path: &Path, _options: OcrOptions) -> Result<OcrResponse, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OcrResponse {
                pages: vec![OcrPage { page: 1, text_blocks: vec![], tables: vec![], images: vec![] }],
            })
        }
    }

    #[tokio::test]
    async fn skip_ocr_reuses_cache_without_calling_provider() {
        let tmp = tempfile::tempdir().unwrap();
        let cache_path = tmp.path().join("meno_ocr.json");
        let provider = CountingProvider { calls: AtomicU32::new(0) };

        let first = recognize_with_cache(
            &provider,
            Path::new("meno.pdf"),
            &cache_path,
            OcrOptions { skip_ocr: false, use_annotations: false },
        )
        .await
        .unwrap();
        assert_eq!(first.page_count(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let second = recognize_with_cache(
            &provider,
            Path::new("meno.pdf"),
            &cache_path,
            OcrOptions { skip_ocr: true, use_annotations: false },
        )
        .await
        .unwrap();
        assert_eq!(second.page_count(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1, "provider must not be called again");
    }

    #[tokio::test]
    async fn calls_provider_when_cache_absent_even_if_skip_requested() {
        let tmp = tempfile::tempdir().unwrap();
        let cache_path = tmp.path().join("absent.json");
        let provider = CountingProvider { calls: AtomicU32::new(0) };
        recognize_with_cache(
            &provider,
            Path::new("absent.pdf"),
            &cache_path,
            OcrOptions { skip_ocr: true, use_annotations: false },
        )
        .await
        .unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(cache_path.exists());
    }
}
