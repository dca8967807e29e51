//! Command-line interface: argument parsing plus the generic HTTP provider
//! adapters used to wire Core B's ingestion pipeline to a configured
//! endpoint when invoked from the binary.

pub mod args;
pub mod providers;

pub use args::{Args, Commands, CorpusCommands};
pub use providers::{HttpOcrProvider, HttpStructureLlmProvider};
