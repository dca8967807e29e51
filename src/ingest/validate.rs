//! Validator & Keyworder: extracts 3-15 keywords per chunk via the shared
//! structured-extraction contract, and drops a chunk if the LLM reports it
//! as nonsensical with high confidence.

use serde::{Deserialize, Serialize};

use super::llm_provider::{complete_structured, StructureLlmError, StructureLlmProvider};
use crate::domain::Chunk;

const MIN_KEYWORDS: usize = 3;
const MAX_KEYWORDS: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ValidationResponse {
    keywords: Vec<String>,
    is_nonsensical: bool,
    confidence: f32,
}

/// Confidence above which a chunk flagged nonsensical is actually dropped,
/// rather than kept with an empty keyword list.
const NONSENSE_CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Run every chunk through the validator/keyworder. Chunks the LLM marks
/// nonsensical above `NONSENSE_CONFIDENCE_THRESHOLD` are dropped, leaving
/// `order_index` gaps for the pipeline to renumber; survivors get their
/// `keywords` populated, clamped to `MAX_KEYWORDS`.
pub async fn validate_and_keyword(
    provider: &dyn StructureLlmProvider,
    chunks: Vec<Chunk>,
) -> Result<Vec<Chunk>, StructureLlmError> {
    let mut kept = Vec::with_capacity(chunks.len());
    for mut chunk in chunks {
        let prompt = format!(
            "Extract {MIN_KEYWORDS}-{MAX_KEYWORDS} keywords for this passage and report whether it is \
             nonsensical (garbled OCR output rather than real prose), with a confidence from 0 to 1. \
             Respond as JSON {{keywords: [string], is_nonsensical: bool, confidence: number}}.\n\n{}",
            chunk.text
        );
        let response: ValidationResponse = complete_structured(provider, &prompt).await?;

        if response.is_nonsensical && response.confidence >= NONSENSE_CONFIDENCE_THRESHOLD {
            continue;
        }

        let mut keywords = response.keywords;
        keywords.truncate(MAX_KEYWORDS);
        chunk.keywords = keywords;
        kept.push(chunk);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentSnapshot, UnitType, WorkSnapshot};
    use crate::ingest::llm_provider::LlmProviderKind;
    use async_trait::async_trait;

    fn make_chunk(text: &str, order_index: u32) -> Chunk {
        Chunk {
            text: text.to_string(),
            keywords: vec![],
            section_path: "1".into(),
            section_level: 1,
            chapter_title: None,
            canonical_reference: None,
            unit_type: UnitType::Argument,
            order_index,
            language: "en".into(),
            work: WorkSnapshot { title: "Meno".into(), author: "Plato".into() },
            document: DocumentSnapshot { source_id: "meno".into(), edition: "Jowett".into(), language: "en".into() },
        }
    }

    struct FixtureProvider;

    #[async_trait]
    impl StructureLlmProvider for FixtureProvider {
        async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, StructureLlmError> {
            if prompt.contains("garbled") {
                Ok(r#"{"keywords": [], "is_nonsensical": true, "confidence": 0.95}"#.to_string())
            } else {
                Ok(r#"{"keywords": ["virtue", "knowledge", "recollection", "teaching"], "is_nonsensical": false, "confidence": 0.1}"#.to_string())
            }
        }

        fn kind(&self) -> LlmProviderKind {
            LlmProviderKind::Local
        }
    }

    #[tokio::test]
    async fn keeps_coherent_chunks_with_keywords_attached() {
        let chunks = vec![make_chunk("Socrates asks Meno whether virtue can be taught.", 0)];
        let validated = validate_and_keyword(&FixtureProvider, chunks).await.unwrap();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].keywords.len(), 4);
    }

    #[tokio::test]
    async fn drops_high_confidence_garbled_chunks() {
        let chunks = vec![make_chunk("garbled ocr soup text", 0), make_chunk("Socrates continues the argument.", 1)];
        let mut validated = validate_and_keyword(&FixtureProvider, chunks).await.unwrap();
        assert_eq!(validated.len(), 1);

        // validate_and_keyword leaves the gap at order_index 1; the pipeline's
        // renumbering pass is what makes the survivor dense again.
        for (i, chunk) in validated.iter_mut().enumerate() {
            chunk.order_index = i as u32;
        }
        assert_eq!(validated[0].order_index, 0);
    }
}
