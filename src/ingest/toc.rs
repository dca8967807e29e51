//! TOC Extraction: two strategies for producing a hierarchical table of
//! contents from the markdown document.

use serde::{Deserialize, Serialize};

use super::llm_provider::{complete_structured, StructureLlmError, StructureLlmProvider};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub level: u8,
    pub page: Option<u32>,
    pub children: Vec<TocEntry>,
}

/// Which extraction strategy to run. Exposed as an explicit option rather
/// than hardcoded, per the open question on strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocStrategy {
    /// Parse a leading "Table of contents" block whose entries look like
    /// `Title…page`. Fast and free.
    Indentation,
    /// Ask the LLM for a nested list. Used when no such block is found.
    Llm,
}

/// How many leading lines of the markdown document are scanned for a TOC
/// heading before giving up on the indentation strategy.
const SCAN_LINES: usize = 400;

/// `true` iff the first `SCAN_LINES` lines contain a recognisable "Table of
/// contents" heading with `Title…page`-shaped entries following it.
pub fn detect_strategy(markdown: &str) -> TocStrategy {
    let lines: Vec<&str> = markdown.lines().take(SCAN_LINES).collect();
    let heading_index = lines.iter().position(|line| {
        let lower = line.to_lowercase();
        lower.contains("table of contents") || lower.trim_start_matches('#').trim() == "contents"
    });
    match heading_index {
        Some(index) => {
            let has_dotted_entry = lines[index + 1..].iter().any(|line| looks_like_toc_entry(line));
            if has_dotted_entry {
                TocStrategy::Indentation
            } else {
                TocStrategy::Llm
            }
        }
        None => TocStrategy::Llm,
    }
}

fn looks_like_toc_entry(line: &str) -> bool {
    !line.trim().is_empty() && line.chars().filter(|c| *c == '.').count() >= 2
        && line.trim_end().chars().last().is_some_and(|c| c.is_ascii_digit())
}

/// Parse indentation-based TOC entries: leading-space count determines
/// level (0-2 -> 1, 3-6 -> 2, >=7 -> 3), nested via a parent stack.
pub fn parse_indentation_toc(markdown: &str) -> Vec<TocEntry> {
    let lines: Vec<&str> = markdown.lines().take(SCAN_LINES).collect();
    let Some(start) = lines.iter().position(|line| {
        let lower = line.to_lowercase();
        lower.contains("table of contents") || lower.trim_start_matches('#').trim() == "contents"
    }) else {
        return Vec::new();
    };

    let mut root: Vec<TocEntry> = Vec::new();
    // stack of (level, index path into `root` via nested children) -- we
    // track owning vectors by level using a stack of mutable references is
    // awkward in safe Rust, so instead build level-tagged flat entries then
    // fold them into a tree.
    let mut flat: Vec<(u8, TocEntry)> = Vec::new();

    for line in &lines[start + 1..] {
        if !looks_like_toc_entry(line) {
            if line.trim().is_empty() {
                continue;
            }
            if flat.is_empty() {
                continue;
            }
            break;
        }
        let leading_spaces = line.chars().take_while(|c| *c == ' ').count();
        let level = if leading_spaces <= 2 {
            1
        } else if leading_spaces <= 6 {
            2
        } else {
            3
        };
        let (title, page) = split_title_page(line);
        flat.push((level, TocEntry { title, level, page, children: Vec::new() }));
    }

    fold_into_tree(&mut flat, &mut root, 1);
    root
}

fn split_title_page(line: &str) -> (String, Option<u32>) {
    let trimmed = line.trim();
    let title_part = trimmed.trim_end_matches(|c: char| c == '.' || c.is_ascii_digit() || c.is_whitespace());
    let page = trimmed
        .rsplit(|c: char| c == '.' || c.is_whitespace())
        .find(|tok| !tok.is_empty())
        .and_then(|tok| tok.parse::<u32>().ok());
    (title_part.trim_end_matches('.').trim().to_string(), page)
}

/// Fold a flat, level-tagged entry list into a tree, consuming entries from
/// `flat` as children are claimed at the current level.
fn fold_into_tree(flat: &mut Vec<(u8, TocEntry)>, out: &mut Vec<TocEntry>, current_level: u8) {
    while let Some((level, _)) = flat.first() {
        if *level < current_level {
            return;
        }
        let (level, mut entry) = flat.remove(0);
        if level > current_level {
            // Orphaned deeper entry with no parent at this level; attach
            // directly rather than drop it.
            out.push(entry);
            continue;
        }
        fold_into_tree(flat, &mut entry.children, current_level + 1);
        out.push(entry);
    }
}

pub async fn extract_toc_via_llm(
    provider: &dyn StructureLlmProvider,
    markdown: &str,
) -> Result<Vec<TocEntry>, StructureLlmError> {
    let truncated: String = markdown.chars().take(12_000).collect();
    let prompt = format!(
        "Extract the table of contents as a nested JSON list of {{title, level, page, children}} \
         from this document:\n\n{truncated}"
    );
    complete_structured(provider, &prompt).await
}
