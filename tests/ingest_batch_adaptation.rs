//! Scenario 5: a document whose mean chunk length is ~60k chars ingests
//! cleanly in batches of 10 (the adaptive batch-size threshold), without any
//! chunk being dropped or reordered.

use std::sync::Arc;

use rag_agent::domain::{Chunk, DocumentSnapshot, UnitType, WorkSnapshot};
use rag_agent::ingest::metadata::DocumentMetadata;
use rag_agent::store::{chunk_batch_size, InMemoryVectorStore, VectorStore};

fn metadata() -> DocumentMetadata {
    DocumentMetadata { title: "Long Work".into(), author: "Anonymous".into(), original_title: None, year: None, language: "en".into(), genre: None }
}

fn long_chunk(order_index: u32) -> Chunk {
    Chunk {
        text: "x".repeat(60_000),
        keywords: vec![],
        section_path: "Book > Chapter One".into(),
        section_level: 2,
        chapter_title: None,
        canonical_reference: None,
        unit_type: UnitType::MainContent,
        order_index,
        language: "en".into(),
        work: WorkSnapshot { title: "Long Work".into(), author: "Anonymous".into() },
        document: DocumentSnapshot { source_id: "long-doc".into(), edition: "1st".into(), language: "en".into() },
    }
}

#[test]
fn mean_length_of_60k_selects_batch_size_10() {
    assert_eq!(chunk_batch_size(60_000.0), 10);
}

#[tokio::test]
async fn ingesting_long_chunks_inserts_all_of_them_without_loss() {
    let store = Arc::new(InMemoryVectorStore::new());
    let chunks: Vec<Chunk> = (0..23).map(long_chunk).collect();

    let report = store
        .ingest_document("long-doc", chunks, vec![], &metadata(), serde_json::json!([]), serde_json::json!([]), 120)
        .await
        .unwrap();

    assert_eq!(report.inserted, 23);
    assert_eq!(report.failed, 0);
    assert_eq!(store.count(rag_agent::store::Collection::Chunk).await.unwrap(), 23);
}
