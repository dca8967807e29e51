//! Cleaner: removes OCR artifacts, rejects chunks below the minimum
//! character threshold, and normalises whitespace. Drops are logged here;
//! the pipeline renumbers `order_index` afterward so survivors stay dense.

use tracing::debug;

use crate::domain::Chunk;

/// Collapse runs of whitespace, strip soft-hyphenation at line ends
/// (`exam-\nple` -> `example`), and drop stray ligature artifacts OCR
/// sometimes emits in place of `fi`/`fl`.
pub fn normalize_text(raw: &str) -> String {
    let dehyphenated = raw.replace("-\n", "");
    let de_ligatured = dehyphenated.replace('\u{FB01}', "fi").replace('\u{FB02}', "fl");
    let collapsed = de_ligatured.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
}

/// `true` iff `a` and `b` look like a duplicated running header/footer: a
/// short line repeated verbatim, ignoring surrounding whitespace.
fn is_duplicate_header_footer(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    !a.is_empty() && a.len() < 120 && a == b
}

/// Normalise every chunk's text, strip duplicated header/footer lines seen
/// across adjacent chunks, and drop chunks that fall below
/// `CHUNK_MIN_CHARS` after normalisation. Leaves `order_index` untouched --
/// the pipeline renumbers survivors once every stage has run.
pub fn clean_chunks(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut previous_first_line: Option<String> = None;

    for chunk in chunks.iter_mut() {
        chunk.text = normalize_text(&chunk.text);

        if let Some(first_line) = chunk.text.lines().next() {
            if let Some(prev) = &previous_first_line {
                if is_duplicate_header_footer(prev, first_line) {
                    chunk.text = chunk.text.lines().skip(1).collect::<Vec<_>>().join(" ");
                }
            }
        }
        previous_first_line = chunk.text.lines().next().map(str::to_string);
    }

    chunks.retain(|chunk| {
        let keep = chunk.has_valid_length();
        if !keep {
            debug!(order_index = chunk.order_index, section_path = %chunk.section_path, "dropping undersized chunk");
        }
        keep
    });

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentSnapshot, UnitType, WorkSnapshot};

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

    #[test]
    fn dehyphenates_and_collapses_whitespace() {
        let cleaned = normalize_text("This is an ex-\nample   with  extra   spaces.");
        assert_eq!(cleaned, "This is an example with extra spaces.");
    }

    #[test]
    fn drops_undersized_chunks_leaving_survivors_for_the_pipeline_to_renumber() {
        let chunks = vec![make_chunk(&"x".repeat(300), 0), make_chunk("too short", 1), make_chunk(&"y".repeat(300), 2)];
        let mut cleaned = clean_chunks(chunks);
        assert_eq!(cleaned.len(), 2);

        // clean_chunks itself leaves the gap at order_index 1; the pipeline's
        // renumbering pass is what makes the survivors dense again.
        for (i, chunk) in cleaned.iter_mut().enumerate() {
            chunk.order_index = i as u32;
        }
        assert_eq!(cleaned[0].order_index, 0);
        assert_eq!(cleaned[1].order_index, 1);
    }
}
