//! Section Classification: assigns each top-level TOC section a semantic
//! category so the chunker can drop boilerplate sections.

use serde::{Deserialize, Serialize};

use super::llm_provider::{complete_structured, StructureLlmError, StructureLlmProvider};
use super::toc::TocEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionCategory {
    MainContent,
    Preface,
    Introduction,
    Conclusion,
    Bibliography,
    Appendix,
    Notes,
    TableOfContents,
    Index,
    Acknowledgments,
    Abstract,
    Ignore,
}

impl SectionCategory {
    /// `true` iff sections of this category are dropped from the chunking
    /// pass.
    pub fn is_ignored(self) -> bool {
        matches!(self, SectionCategory::Ignore)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedSection {
    pub title: String,
    pub category: SectionCategory,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    category: SectionCategory,
}

pub async fn classify_sections(
    provider: &dyn StructureLlmProvider,
    toc: &[TocEntry],
) -> Result<Vec<ClassifiedSection>, StructureLlmError> {
    let mut classified = Vec::with_capacity(toc.len());
    for entry in toc {
        let prompt = format!(
            "Classify this top-level document section title into exactly one of: main_content, preface, \
             introduction, conclusion, bibliography, appendix, notes, table_of_contents, index, \
             acknowledgments, abstract, ignore. Respond as JSON {{category}}.\n\nTitle: {}",
            entry.title
        );
        let response: ClassifyResponse = complete_structured(provider, &prompt).await?;
        classified.push(ClassifiedSection { title: entry.title.clone(), category: response.category });
    }
    Ok(classified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::llm_provider::LlmProviderKind;
    use async_trait::async_trait;

    struct FixtureProvider;

    #[async_trait]
    impl StructureLlmProvider for FixtureProvider {
        async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, StructureLlmError> {
            if prompt.contains("Bibliography") {
                Ok(r#"{"category": "bibliography"}"#.to_string())
            } else {
                Ok(r#"{"category": "main_content"}"#.to_string())
            }
        }

        fn kind(&self) -> LlmProviderKind {
            LlmProviderKind::Local
        }
    }

    #[tokio::test]
    async fn classifies_sections_and_flags_ignorable_ones() {
        let toc = vec![
            TocEntry { title: "Meno".into(), level: 1, page: None, children: vec![] },
            TocEntry { title: "Bibliography".into(), level: 1, page: None, children: vec![] },
        ];
        let classified = classify_sections(&FixtureProvider, &toc).await.unwrap();
        assert_eq!(classified[0].category, SectionCategory::MainContent);
        assert_eq!(classified[1].category, SectionCategory::Bibliography);
        assert!(!classified[0].category.is_ignored());
    }
}
