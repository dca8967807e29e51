use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A canonical philosophical or academic opus, independent of any particular
/// edition. Title and author are semantically indexed by the vector store;
/// everything else here is metadata only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Work {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    /// Negative values are BCE.
    pub year: i64,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// The `{title, author}` snapshot denormalised into `Document`, `Chunk`, and
/// `Summary` at insertion time. Never mutated independently of its parent
/// `Work`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkSnapshot {
    pub title: String,
    pub author: String,
}

impl From<&Work> for WorkSnapshot {
    fn from(work: &Work) -> Self {
        Self {
            title: work.title.clone(),
            author: work.author.clone(),
        }
    }
}

/// A single edition of a `Work`. Metadata only; not semantically indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique key, the filename stem the document was ingested from.
    pub source_id: String,
    pub edition: String,
    pub language: String,
    pub pages: u32,
    pub chunks_count: u32,
    pub toc: Value,
    pub hierarchy: Value,
    pub created_at: DateTime<Utc>,
    pub work: WorkSnapshot,
}

/// The `{source_id, edition, language}` snapshot denormalised into `Chunk`
/// and `Summary` at insertion time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub source_id: String,
    pub edition: String,
    pub language: String,
}

impl From<&Document> for DocumentSnapshot {
    fn from(doc: &Document) -> Self {
        Self {
            source_id: doc.source_id.clone(),
            edition: doc.edition.clone(),
            language: doc.language.clone(),
        }
    }
}

/// Argumentative role of a chunk within its section. Unknown values are
/// rejected at deserialisation rather than coerced to a default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    MainContent,
    Argument,
    Definition,
    Example,
    Citation,
    Question,
    Objection,
    Response,
    Analysis,
    Synthesis,
    Transition,
}

/// Character bounds an argumentative unit must fall within before cleaning
/// can split or reject it.
pub const CHUNK_MIN_CHARS: usize = 200;
pub const CHUNK_MAX_CHARS: usize = 8000;

/// A 200-8000 character argumentative unit belonging to a `Document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub keywords: Vec<String>,
    pub section_path: String,
    pub section_level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_reference: Option<String>,
    pub unit_type: UnitType,
    /// 0-based, dense and unique within its `Document`.
    pub order_index: u32,
    pub language: String,
    pub work: WorkSnapshot,
    pub document: DocumentSnapshot,
}

impl Chunk {
    /// `false` when `text` falls outside `[CHUNK_MIN_CHARS, CHUNK_MAX_CHARS]`.
    pub fn has_valid_length(&self) -> bool {
        let len = self.text.chars().count();
        (CHUNK_MIN_CHARS..=CHUNK_MAX_CHARS).contains(&len)
    }
}

/// A section-scoped LLM summary, linked to its chunks by string-prefix match
/// on `section_path` rather than a cross-reference id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub concepts: Vec<String>,
    pub section_path: String,
    pub title: String,
    /// 1 = chapter, 2 = section, 3 = subsection.
    pub level: u8,
    pub chunks_count: u32,
    pub document: DocumentSnapshot,
    /// `true` when no chunk matched `section_path` and this summary is a
    /// `{text: title, concepts: [], chunks_count: 0}` placeholder.
    pub is_fallback: bool,
}

impl Summary {
    pub fn fallback(title: &str, section_path: &str, level: u8, document: DocumentSnapshot) -> Self {
        Self {
            text: title.to_string(),
            concepts: Vec::new(),
            section_path: section_path.to_string(),
            title: title.to_string(),
            level,
            chunks_count: 0,
            document,
            is_fallback: true,
        }
    }
}

/// Collapse whitespace and use a stable `" > "` separator so that prefix
/// matching between `Chunk::section_path` and `Summary::section_path` is
/// total and deterministic, per the linkage design note.
pub fn normalize_section_path(raw: &str) -> String {
    raw.split('>')
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// `true` iff `chunk_path` belongs under `summary_path` by the linkage rule:
/// a normalised string-prefix match, not a cross-reference id.
pub fn section_path_starts_with(chunk_path: &str, summary_path: &str) -> bool {
    normalize_section_path(chunk_path).starts_with(&normalize_section_path(summary_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_and_separator() {
        assert_eq!(
            normalize_section_path("Peirce: CP 5.314   >   The categories"),
            "Peirce: CP 5.314 > The categories"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_section_path("  A  >B>  C ");
        let twice = normalize_section_path(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn prefix_match_respects_normalisation() {
        assert!(section_path_starts_with(
            "Meno > Virtue  >  Definition",
            "Meno  >  Virtue"
        ));
        assert!(!section_path_starts_with("Meno > Vice", "Meno > Virtue"));
    }

    #[test]
    fn chunk_length_bounds() {
        let mut chunk = sample_chunk("x".repeat(200));
        assert!(chunk.has_valid_length());
        chunk.text = "x".repeat(199);
        assert!(!chunk.has_valid_length());
        chunk.text = "x".repeat(8000);
        assert!(chunk.has_valid_length());
        chunk.text = "x".repeat(8001);
        assert!(!chunk.has_valid_length());
    }

    fn sample_chunk(text: String) -> Chunk {
        Chunk {
            text,
            keywords: vec!["virtue".into()],
            section_path: "Meno > Virtue".into(),
            section_level: 2,
            chapter_title: None,
            canonical_reference: Some("80a".into()),
            unit_type: UnitType::Argument,
            order_index: 0,
            language: "en".into(),
            work: WorkSnapshot {
                title: "Meno".into(),
                author: "Plato".into(),
            },
            document: DocumentSnapshot {
                source_id: "meno".into(),
                edition: "Jowett".into(),
                language: "en".into(),
            },
        }
    }
}
