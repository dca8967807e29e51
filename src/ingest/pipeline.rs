//! Pipeline Orchestrator: drives the ten ingestion stages in strict order,
//! emitting progress events and maintaining a cost ledger. Generalises the
//! teacher's "one struct that owns and sequences every subsystem" shape
//! from Core A's task lifecycle to Core B's fixed pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Chunk, DocumentSnapshot, Summary, WorkSnapshot};
use crate::env;
use crate::ledger::CostLedger;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::VectorStore;

use super::chunker::{chunk_section, ChunkContext};
use super::classify::{classify_sections, ClassifiedSection, SectionCategory};
use super::clean::clean_chunks;
use super::llm_provider::{LlmProviderKind, StructureLlmError, StructureLlmProvider};
use super::markdown::build_markdown;
use super::metadata::{extract_metadata, DocumentMetadata};
use super::ocr::{recognize_with_cache, OcrError, OcrOptions, OcrProvider};
use super::summarise::{summarise_toc, write_checkpoint, SummariseError};
use super::toc::{detect_strategy, extract_toc_via_llm, parse_indentation_toc, TocEntry, TocStrategy};
use super::validate::validate_and_keyword;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Llm(#[from] StructureLlmError),
    #[error(transparent)]
    Summarise(#[from] SummariseError),
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
    #[error("output I/O error at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("output is not valid JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Which backend drives the structured-extraction stages, and how.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub skip_ocr: bool,
    pub use_llm: bool,
    pub llm_provider: LlmProviderKind,
    pub llm_model: Option<String>,
    pub use_ocr_annotations: bool,
    pub use_semantic_chunking: bool,
    pub ingest_to_vector_store: bool,
    pub generate_summaries: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_ocr: false,
            use_llm: true,
            llm_provider: LlmProviderKind::Local,
            llm_model: None,
            use_ocr_annotations: false,
            use_semantic_chunking: true,
            ingest_to_vector_store: true,
            generate_summaries: true,
        }
    }
}

/// The `<doc>_chunks.json` output contract.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub metadata: DocumentMetadata,
    pub toc: Vec<TocEntry>,
    pub hierarchy: Vec<ClassifiedSection>,
    pub classified_sections: Vec<ClassifiedSection>,
    pub chunks: Vec<Chunk>,
    pub summaries: Vec<Summary>,
    pub cost_ocr: f64,
    pub cost_llm: f64,
    pub cost_total: f64,
    pub pages: u32,
    pub chunks_count: u32,
}

pub struct PipelineOrchestrator {
    ocr_provider: Arc<dyn OcrProvider>,
    structure_llm_provider: Arc<dyn StructureLlmProvider>,
    vector_store: Option<Arc<dyn VectorStore>>,
    progress: Arc<dyn ProgressReporter>,
    output_root: PathBuf,
}

const TOTAL_STEPS: u32 = 10;

impl PipelineOrchestrator {
    pub fn new(
        ocr_provider: Arc<dyn OcrProvider>,
        structure_llm_provider: Arc<dyn StructureLlmProvider>,
        vector_store: Option<Arc<dyn VectorStore>>,
        progress: Arc<dyn ProgressReporter>,
        output_root: PathBuf,
    ) -> Self {
        Self { ocr_provider, structure_llm_provider, vector_store, progress, output_root }
    }

    /// Run every stage for one document. `edition` identifies the specific
    /// printing/translation being ingested (e.g. "Jowett translation").
    pub async fn run(
        &self,
        pdf_path: &Path,
        doc_stem: &str,
        edition: &str,
        config: &PipelineConfig,
    ) -> Result<PipelineOutput, PipelineError> {
        let mut ledger = CostLedger::new();
        let result = self.run_stages(pdf_path, doc_stem, edition, config, &mut ledger).await;

        match &result {
            Ok(_) => self.progress.report(ProgressEvent::Complete { label: format!("ingest:{doc_stem}") }),
            Err(error) => {
                self.progress.report(ProgressEvent::Error { label: format!("ingest:{doc_stem}"), message: error.to_string() });
                // Flush whatever the ledger accumulated so a retry can reuse
                // the cached OCR response even though this run failed later.
                let _ = self.flush_partial_ledger(doc_stem, &ledger).await;
            }
        }
        result
    }

    async fn run_stages(
        &self,
        pdf_path: &Path,
        doc_stem: &str,
        edition: &str,
        config: &PipelineConfig,
        ledger: &mut CostLedger,
    ) -> Result<PipelineOutput, PipelineError> {
        self.step(1, "ocr", doc_stem);
        let cache_path = env::ocr_cache_file_path(&self.output_root, doc_stem);
        let ocr_options = OcrOptions { skip_ocr: config.skip_ocr, use_annotations: config.use_ocr_annotations };
        let ocr_response = recognize_with_cache(self.ocr_provider.as_ref(), pdf_path, &cache_path, ocr_options).await?;
        if !config.skip_ocr {
            ledger.record_ocr(estimate_ocr_cost(ocr_response.page_count(), config.use_ocr_annotations));
        }
        let pages = ocr_response.page_count() as u32;

        self.step(2, "markdown", doc_stem);
        let markdown = build_markdown(&ocr_response, doc_stem);

        self.step(3, "metadata", doc_stem);
        let metadata = extract_metadata(self.structure_llm_provider.as_ref(), &markdown).await?;
        ledger.record_llm(estimate_llm_cost(&markdown));

        self.step(4, "toc", doc_stem);
        let toc = match detect_strategy(&markdown) {
            TocStrategy::Indentation => parse_indentation_toc(&markdown),
            TocStrategy::Llm => {
                let entries = extract_toc_via_llm(self.structure_llm_provider.as_ref(), &markdown).await?;
                ledger.record_llm(estimate_llm_cost(&markdown));
                entries
            }
        };

        self.step(5, "classify", doc_stem);
        let classified = classify_sections(self.structure_llm_provider.as_ref(), &toc).await?;
        ledger.record_llm(classified.len() as f64 * PER_CALL_LLM_COST);

        self.step(6, "chunk", doc_stem);
        let work = WorkSnapshot { title: metadata.title.clone(), author: metadata.author.clone() };
        let document = DocumentSnapshot { source_id: doc_stem.to_string(), edition: edition.to_string(), language: metadata.language.clone() };
        let context = ChunkContext { language: metadata.language.clone(), work, document: document.clone() };
        let mut chunks = Vec::new();
        let mut order_index = 0u32;
        for (index, entry) in toc.iter().enumerate() {
            let category = classified.get(index).map(|c| c.category).unwrap_or(SectionCategory::MainContent);
            if category.is_ignored() {
                continue;
            }
            let next_title = toc.get(index + 1).map(|e| e.title.as_str());
            let body = extract_section_body(&markdown, &entry.title, next_title);
            let unit_type = crate::domain::UnitType::MainContent;
            let section_chunks = if config.use_semantic_chunking {
                chunk_section(&context, &body, &entry.title, entry.level, Some(&entry.title), unit_type, order_index)
            } else {
                vec![Chunk {
                    text: body,
                    keywords: Vec::new(),
                    section_path: entry.title.clone(),
                    section_level: entry.level,
                    chapter_title: Some(entry.title.clone()),
                    canonical_reference: None,
                    unit_type,
                    order_index,
                    language: context.language.clone(),
                    work: context.work.clone(),
                    document: context.document.clone(),
                }]
            };
            order_index += section_chunks.len() as u32;
            chunks.extend(section_chunks);
        }

        self.step(7, "clean", doc_stem);
        let chunks = clean_chunks(chunks);

        self.step(8, "validate", doc_stem);
        let chunks = if config.use_llm {
            let validated = validate_and_keyword(self.structure_llm_provider.as_ref(), chunks).await?;
            ledger.record_llm(validated.len() as f64 * PER_CALL_LLM_COST);
            validated
        } else {
            chunks
        };
        let mut chunks = chunks;
        for (index, chunk) in chunks.iter_mut().enumerate() {
            chunk.order_index = index as u32;
        }

        self.step(9, "summarise", doc_stem);
        let summaries = if config.generate_summaries {
            let checkpoint_path = env::summaries_checkpoint_path(&self.output_root, doc_stem);
            let mut completed = Vec::new();
            let summaries = summarise_toc(self.structure_llm_provider.as_ref(), &toc, &chunks, &document, |summary| {
                completed.push(summary.clone());
            })
            .await?;
            write_checkpoint(&checkpoint_path, &summaries).await?;
            ledger.record_llm(summaries.iter().filter(|s| !s.is_fallback).count() as f64 * PER_CALL_LLM_COST);
            summaries
        } else {
            Vec::new()
        };

        self.step(10, "vector-store", doc_stem);
        if config.ingest_to_vector_store {
            if let Some(store) = &self.vector_store {
                let toc_value = serde_json::to_value(&toc)?;
                let hierarchy_value = serde_json::to_value(&classified)?;
                store
                    .ingest_document(doc_stem, chunks.clone(), summaries.clone(), &metadata, toc_value, hierarchy_value, pages)
                    .await?;
            }
        }

        let output = PipelineOutput {
            metadata,
            toc,
            hierarchy: classified.clone(),
            classified_sections: classified,
            chunks_count: chunks.len() as u32,
            chunks,
            summaries,
            cost_ocr: ledger.cost_ocr,
            cost_llm: ledger.cost_llm,
            cost_total: ledger.cost_total(),
            pages,
        };

        let output_path = env::chunks_output_path(&self.output_root, doc_stem);
        self.write_output(&output_path, &output).await?;

        Ok(output)
    }

    fn step(&self, step: u32, label: &str, doc_stem: &str) {
        self.progress.report(ProgressEvent::step(step, TOTAL_STEPS, format!("{label}:{doc_stem}")));
    }

    async fn write_output(&self, path: &Path, output: &PipelineOutput) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| PipelineError::Io { path: parent.display().to_string(), source: e })?;
        }
        let body = serde_json::to_vec_pretty(output)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body).await.map_err(|e| PipelineError::Io { path: tmp_path.display().to_string(), source: e })?;
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| PipelineError::Io { path: path.display().to_string(), source: e })?;
        Ok(())
    }

    async fn flush_partial_ledger(&self, doc_stem: &str, ledger: &CostLedger) -> Result<(), PipelineError> {
        let path = env::doc_output_dir_path(&self.output_root, doc_stem).join(format!("{doc_stem}_ledger.json"));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| PipelineError::Io { path: parent.display().to_string(), source: e })?;
        }
        let body = serde_json::to_vec_pretty(ledger)?;
        tokio::fs::write(&path, &body).await.map_err(|e| PipelineError::Io { path: path.display().to_string(), source: e })?;
        Ok(())
    }
}

/// Slice `markdown` between the first occurrence of `title` and the first
/// occurrence of `next_title` after it (or the end of the document, if this
/// is the last section).
fn extract_section_body(markdown: &str, title: &str, next_title: Option<&str>) -> String {
    let start = markdown.find(title).map(|pos| pos + title.len()).unwrap_or(0);
    let remainder = &markdown[start.min(markdown.len())..];
    match next_title.and_then(|next| remainder.find(next)) {
        Some(end) => remainder[..end].trim().to_string(),
        None => remainder.trim().to_string(),
    }
}

const PER_CALL_LLM_COST: f64 = 0.002;

fn estimate_ocr_cost(page_count: usize, use_annotations: bool) -> f64 {
    let per_page = if use_annotations { 0.03 } else { 0.01 };
    page_count as f64 * per_page
}

fn estimate_llm_cost(markdown: &str) -> f64 {
    (markdown.len() as f64 / 4000.0) * PER_CALL_LLM_COST
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ocr::{OcrPage, OcrResponse, TextBlock};
    use crate::store::InMemoryVectorStore;
    use async_trait::async_trait;

    struct FixtureOcrProvider;

    #[async_trait]
    impl OcrProvider for FixtureOcrProvider {
        async fn recognize(&self, _pdf_path: &Path, _options: OcrOptions) -> Result<OcrResponse, OcrError> {
            Ok(OcrResponse {
                pages: vec![OcrPage {
                    page: 1,
                    text_blocks: vec![TextBlock {
                        text: "Table of Contents\n\nIntroduction...1\n\nIntroduction\n\nSocrates asks Meno whether virtue can be taught, and whether it comes by nature, habit, or teaching. The two of them examine several candidate definitions before concluding that virtue may be a kind of divine gift rather than something taught directly."
                            .into(),
                        page: 1,
                    }],
                    tables: vec![],
                    images: vec![],
                }],
            })
        }
    }

    struct FixtureLlmProvider;

    #[async_trait]
    impl StructureLlmProvider for FixtureLlmProvider {
        async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, StructureLlmError> {
            if prompt.contains("title, author, original_title") {
                Ok(r#"{"title": "Meno", "author": "Plato", "original_title": null, "year": -380, "language": "en", "genre": "dialogue"}"#.to_string())
            } else if prompt.contains("Classify this top-level") {
                Ok(r#"{"category": "main_content"}"#.to_string())
            } else if prompt.contains("is_nonsensical") {
                Ok(r#"{"keywords": ["virtue", "teaching", "nature", "habit"], "is_nonsensical": false, "confidence": 0.05}"#.to_string())
            } else {
                Ok(r#"{"summary": "Socrates and Meno examine whether virtue can be taught.", "concepts": ["virtue", "teaching", "divine gift"]}"#.to_string())
            }
        }

        fn kind(&self) -> LlmProviderKind {
            LlmProviderKind::Local
        }
    }

    #[tokio::test]
    async fn runs_every_stage_and_writes_chunks_json() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryVectorStore::new());
        let orchestrator = PipelineOrchestrator::new(
            Arc::new(FixtureOcrProvider),
            Arc::new(FixtureLlmProvider),
            Some(store.clone()),
            Arc::new(crate::progress::NoProgress),
            tmp.path().to_path_buf(),
        );

        let output = orchestrator
            .run(Path::new("meno.pdf"), "meno", "Jowett translation", &PipelineConfig::default())
            .await
            .unwrap();

        assert_eq!(output.metadata.title, "Meno");
        assert_eq!(output.pages, 1);
        assert!(output.chunks_count > 0);
        assert!(output.cost_total > 0.0);
        assert!(!output.summaries.is_empty());

        let output_path = env::chunks_output_path(tmp.path(), "meno");
        assert!(output_path.exists());

        assert_eq!(store.count(crate::store::Collection::Chunk).await.unwrap(), output.chunks_count as u64);
    }

    #[test]
    fn extracts_body_between_consecutive_titles() {
        let markdown = "# Meno\n\nIntroduction\n\nBody one.\n\nConclusion\n\nBody two.";
        let body = extract_section_body(markdown, "Introduction", Some("Conclusion"));
        assert!(body.contains("Body one."));
        assert!(!body.contains("Body two."));
    }
}
