//! Document-ingestion pipeline: OCR -> markdown -> metadata -> TOC ->
//! classify -> chunk -> clean -> validate -> summarise -> vector-store
//! ingest, orchestrated by `pipeline::PipelineOrchestrator`.

pub mod chunker;
pub mod classify;
pub mod clean;
pub mod llm_provider;
pub mod markdown;
pub mod metadata;
pub mod ocr;
pub mod pipeline;
pub mod summarise;
pub mod toc;
pub mod validate;

pub use pipeline::{PipelineConfig, PipelineError, PipelineOrchestrator, PipelineOutput};
