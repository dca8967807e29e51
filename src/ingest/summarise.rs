//! Summariser: produces a per-TOC-node summary by concatenating the chunks
//! whose `section_path` falls under that node, budgeted to a character cap,
//! with fallback summaries for nodes no chunk matches and atomic
//! checkpointing so a fatal error mid-run doesn't lose completed summaries.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::llm_provider::{complete_structured, StructureLlmError, StructureLlmProvider};
use super::toc::TocEntry;
use crate::domain::{section_path_starts_with, Chunk, DocumentSnapshot, Summary};

#[derive(Debug, Error)]
pub enum SummariseError {
    #[error(transparent)]
    Llm(#[from] StructureLlmError),
    #[error("checkpoint I/O error at {path}: {source}")]
    Checkpoint { path: String, #[source] source: std::io::Error },
    #[error("checkpoint file is corrupt: {0}")]
    CorruptCheckpoint(String),
}

/// Maximum chunks folded into one section summary. Additional chunks under
/// the same node are still covered by deeper sub-summaries.
const MAX_CHUNKS_PER_SUMMARY: usize = 20;
/// Character budget for the concatenated chunk text handed to the LLM,
/// roughly 3000 tokens.
const MAX_SUMMARY_INPUT_CHARS: usize = 12_000;

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
    concepts: Vec<String>,
}

/// Walk `toc` depth-first and produce one `Summary` per node. A node whose
/// `section_path` prefix-matches no chunk gets `Summary::fallback`; every
/// other node is summarised from up to `MAX_CHUNKS_PER_SUMMARY` matching
/// chunks, truncated to `MAX_SUMMARY_INPUT_CHARS`. `on_summary` is invoked
/// after each node completes so the caller can checkpoint incrementally.
pub async fn summarise_toc(
    provider: &dyn StructureLlmProvider,
    toc: &[TocEntry],
    chunks: &[Chunk],
    document: &DocumentSnapshot,
    mut on_summary: impl FnMut(&Summary),
) -> Result<Vec<Summary>, SummariseError> {
    let mut summaries = Vec::new();
    summarise_nodes(provider, toc, "", chunks, document, &mut summaries, &mut on_summary).await?;
    Ok(summaries)
}

fn summarise_nodes<'a>(
    provider: &'a dyn StructureLlmProvider,
    nodes: &'a [TocEntry],
    parent_path: &'a str,
    chunks: &'a [Chunk],
    document: &'a DocumentSnapshot,
    out: &'a mut Vec<Summary>,
    on_summary: &'a mut impl FnMut(&Summary),
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), SummariseError>> + 'a>> {
    Box::pin(async move {
        for node in nodes {
            let section_path = if parent_path.is_empty() {
                node.title.clone()
            } else {
                format!("{parent_path} > {}", node.title)
            };

            let summary = summarise_one_node(provider, &section_path, node, chunks, document).await?;
            on_summary(&summary);
            out.push(summary);

            summarise_nodes(provider, &node.children, &section_path, chunks, document, out, on_summary).await?;
        }
        Ok(())
    })
}

async fn summarise_one_node(
    provider: &dyn StructureLlmProvider,
    section_path: &str,
    node: &TocEntry,
    chunks: &[Chunk],
    document: &DocumentSnapshot,
) -> Result<Summary, SummariseError> {
    let matching: Vec<&Chunk> =
        chunks.iter().filter(|chunk| section_path_starts_with(&chunk.section_path, section_path)).take(MAX_CHUNKS_PER_SUMMARY).collect();

    if matching.is_empty() {
        return Ok(Summary::fallback(&node.title, section_path, node.level, document.clone()));
    }

    let mut body = String::new();
    for chunk in &matching {
        if body.len() + chunk.text.len() > MAX_SUMMARY_INPUT_CHARS {
            break;
        }
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        body.push_str(&chunk.text);
    }

    let prompt = format!(
        "Summarise this section titled \"{}\" in 100-400 words and list 5-15 key concepts. \
         Respond as JSON {{summary: string, concepts: [string]}}.\n\n{body}",
        node.title
    );
    let response: SummaryResponse = complete_structured(provider, &prompt).await?;

    Ok(Summary {
        text: response.summary,
        concepts: response.concepts,
        section_path: section_path.to_string(),
        title: node.title.clone(),
        level: node.level,
        chunks_count: matching.len() as u32,
        document: document.clone(),
        is_fallback: false,
    })
}

/// Write the summaries gathered so far to `checkpoint_path` atomically
/// (write-tmp-then-rename), mirroring the OCR cache's write pattern so a
/// crash mid-run never leaves a half-written checkpoint.
pub async fn write_checkpoint(checkpoint_path: &Path, summaries: &[Summary]) -> Result<(), SummariseError> {
    if let Some(parent) = checkpoint_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SummariseError::Checkpoint { path: parent.display().to_string(), source: e })?;
    }
    let tmp_path = checkpoint_path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(summaries).map_err(|e| SummariseError::CorruptCheckpoint(e.to_string()))?;
    tokio::fs::write(&tmp_path, &body)
        .await
        .map_err(|e| SummariseError::Checkpoint { path: tmp_path.display().to_string(), source: e })?;
    tokio::fs::rename(&tmp_path, checkpoint_path)
        .await
        .map_err(|e| SummariseError::Checkpoint { path: checkpoint_path.display().to_string(), source: e })?;
    Ok(())
}

/// Load a previously-written checkpoint, if any.
pub async fn load_checkpoint(checkpoint_path: &Path) -> Result<Vec<Summary>, SummariseError> {
    let raw = tokio::fs::read_to_string(checkpoint_path)
        .await
        .map_err(|e| SummariseError::Checkpoint { path: checkpoint_path.display().to_string(), source: e })?;
    serde_json::from_str(&raw).map_err(|e| SummariseError::CorruptCheckpoint(e.to_string()))
}
