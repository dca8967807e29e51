//! Semantic Chunker: splits section text into argumentative units of
//! 200-8000 characters, grounded on the paragraph-boundary-then-hard-split
//! algorithm of the pack's closest sibling ingestion pipeline.

use crate::domain::{Chunk, DocumentSnapshot, UnitType, WorkSnapshot, CHUNK_MAX_CHARS};

/// Everything about the owning document a chunk needs to carry, independent
/// of section-specific fields (`section_path`, `unit_type`, ...).
#[derive(Debug, Clone)]
pub struct ChunkContext {
    pub language: String,
    pub work: WorkSnapshot,
    pub document: DocumentSnapshot,
}

/// Split `text` (the body of one classified section) into dense-ordered
/// chunks. Paragraphs (`\n\n`-separated) are packed greedily up to
/// `CHUNK_MAX_CHARS`; a single paragraph exceeding the limit is hard-split
/// at the last newline or space before the boundary, never mid-word. Every
/// emitted piece inherits the section's `section_path`/`section_level`/
/// `chapter_title` and continues the caller-supplied `order_index` run.
pub fn chunk_section(
    context: &ChunkContext,
    text: &str,
    section_path: &str,
    section_level: u8,
    chapter_title: Option<&str>,
    unit_type: UnitType,
    start_order_index: u32,
) -> Vec<Chunk> {
    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for para in paragraphs {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if current.is_empty() { trimmed.len() } else { current.len() + 2 + trimmed.len() };

        if would_be > CHUNK_MAX_CHARS && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }

        if trimmed.len() > CHUNK_MAX_CHARS {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            pieces.extend(hard_split(trimmed));
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(trimmed);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    if pieces.is_empty() {
        pieces.push(text.trim().to_string());
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| Chunk {
            text: piece,
            keywords: Vec::new(),
            section_path: section_path.to_string(),
            section_level,
            chapter_title: chapter_title.map(str::to_string),
            canonical_reference: None,
            unit_type,
            order_index: start_order_index + i as u32,
            language: context.language.clone(),
            work: context.work.clone(),
            document: context.document.clone(),
        })
        .collect()
}

/// Hard-split `text` (known to exceed `CHUNK_MAX_CHARS`) at the last
/// newline or space before each boundary. Pieces this produces may still
/// fall under `CHUNK_MIN_CHARS`; cleaning decides whether to drop them.
fn hard_split(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let split_at = remaining.len().min(CHUNK_MAX_CHARS);
        let actual_split = if split_at < remaining.len() {
            remaining[..split_at]
                .rfind('\n')
                .or_else(|| remaining[..split_at].rfind(' '))
                .map(|pos| pos + 1)
                .unwrap_or(split_at)
        } else {
            split_at
        };
        let piece = remaining[..actual_split].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        remaining = &remaining[actual_split..];
    }
    if pieces.is_empty() {
        pieces.push(text.trim().to_string());
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ChunkContext {
        ChunkContext {
            language: "en".into(),
            work: WorkSnapshot { title: "Meno".into(), author: "Plato".into() },
            document: DocumentSnapshot { source_id: "meno".into(), edition: "Jowett".into(), language: "en".into() },
        }
    }

    #[test]
    fn packs_short_paragraphs_into_one_chunk() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_section(&context(), text, "1", 1, Some("Meno"), UnitType::Argument, 0);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("First paragraph."));
        assert!(chunks[0].text.contains("Third paragraph."));
        assert_eq!(chunks[0].order_index, 0);
    }

    #[test]
    fn hard_splits_a_paragraph_exceeding_the_max_without_breaking_words() {
        let long_paragraph = "word ".repeat(2000);
        let chunks = chunk_section(&context(), &long_paragraph, "1", 1, Some("Meno"), UnitType::Argument, 5);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.len() <= CHUNK_MAX_CHARS);
            assert!(!chunk.text.ends_with("wor"));
        }
    }

    #[test]
    fn order_index_is_dense_and_continues_from_start() {
        let text = (0..30).map(|i| format!("Paragraph number {i} with some body text.")).collect::<Vec<_>>().join("\n\n");
        let chunks = chunk_section(&context(), &text, "1.2", 2, Some("Part One"), UnitType::MainContent, 10);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order_index, 10 + i as u32);
            assert_eq!(chunk.section_path, "1.2");
            assert_eq!(chunk.chapter_title.as_deref(), Some("Part One"));
        }
    }

    #[test]
    fn empty_text_still_emits_one_chunk() {
        let chunks = chunk_section(&context(), "", "1", 1, Some("Meno"), UnitType::Argument, 0);
        assert_eq!(chunks.len(), 1);
    }
}
