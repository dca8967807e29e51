//! Metadata Extraction: produces document metadata from the markdown head
//! and any explicit front-matter.

use serde::{Deserialize, Serialize};

use super::llm_provider::{complete_structured, StructureLlmError, StructureLlmProvider};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub original_title: Option<String>,
    pub year: Option<i32>,
    pub language: String,
    pub genre: Option<String>,
}

/// How many leading characters of the markdown document are shown to the
/// LLM when extracting metadata. The head carries title/author/front-matter
/// in virtually every scanned academic text.
const HEAD_CHARS: usize = 4000;

pub async fn extract_metadata(
    provider: &dyn StructureLlmProvider,
    markdown: &str,
) -> Result<DocumentMetadata, StructureLlmError> {
    let head: String = markdown.chars().take(HEAD_CHARS).collect();
    let prompt = format!(
        "Extract document metadata as JSON matching {{title, author, original_title, year, language, genre}} \
         (original_title, year, genre may be null) from this document head:\n\n{head}"
    );
    complete_structured(provider, &prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::llm_provider::LlmProviderKind;
    use async_trait::async_trait;

    struct FixtureProvider;

    #[async_trait]
    impl StructureLlmProvider for FixtureProvider {
        async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String, StructureLlmError> {
            Ok(r#"{"title": "Meno", "author": "Plato", "original_title": "Μένων", "year": -380, "language": "en", "genre": "dialogue"}"#.to_string())
        }

        fn kind(&self) -> LlmProviderKind {
            LlmProviderKind::Local
        }
    }

    #[tokio::test]
    async fn extracts_metadata_from_fixture_provider() {
        let metadata = extract_metadata(&FixtureProvider, "# Meno\n\nby Plato").await.unwrap();
        assert_eq!(metadata.title, "Meno");
        assert_eq!(metadata.author, "Plato");
        assert_eq!(metadata.original_title.as_deref(), Some("Μένων"));
        assert_eq!(metadata.year, Some(-380));
    }
}
