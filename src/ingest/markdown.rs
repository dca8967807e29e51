//! Markdown Builder: deterministic transformation of OCR output into a
//! single structured markdown document, with image references inlined at
//! their page positions.

use super::ocr::OcrResponse;

/// Render `response` as a single markdown document, titled with `doc_stem`
/// as a level-1 heading until metadata extraction finds a real title. Each
/// page becomes a level-2 heading; text blocks are emitted verbatim, tables
/// as GFM tables, and images as reference links pointing into the
/// `images/` directory.
pub fn build_markdown(response: &OcrResponse, doc_stem: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {doc_stem}\n\n"));
    for page in &response.pages {
        out.push_str(&format!("## Page {}\n\n", page.page));

        for block in &page.text_blocks {
            out.push_str(block.text.trim());
            out.push_str("\n\n");
        }

        for table in &page.tables {
            for (i, row) in table.rows.iter().enumerate() {
                out.push_str("| ");
                out.push_str(&row.join(" | "));
                out.push_str(" |\n");
                if i == 0 {
                    out.push_str("| ");
                    out.push_str(&vec!["---"; row.len()].join(" | "));
                    out.push_str(" |\n");
                }
            }
            out.push('\n');
        }

        for image in &page.images {
            out.push_str(&format!(
                "![page {} image {}](images/page_{}_image_{}.{})\n\n",
                image.page,
                image.index,
                image.page,
                image.index,
                image.path.rsplit('.').next().unwrap_or("png")
            ));
        }
    }
    out
}
