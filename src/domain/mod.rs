//! Core data model shared by both cores: the corpus types Core B ingests and
//! retrieves (`Work`, `Document`, `Chunk`, `Summary`) and the tracker-facing
//! types Core A drives (`WorkItem`, `ProjectMarker`, `Session`).

mod corpus;
mod tracker_entities;

pub use corpus::{
    normalize_section_path, section_path_starts_with, Chunk, Document, DocumentSnapshot, Summary, UnitType,
    Work, WorkSnapshot, CHUNK_MAX_CHARS, CHUNK_MIN_CHARS,
};
pub use tracker_entities::{
    ProjectMarker, Session, SessionKind, SessionTouch, WorkItem, WorkItemComment, WorkItemStatus,
};
