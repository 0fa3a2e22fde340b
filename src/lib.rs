// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod retry;
pub mod store;

pub use crate::api::router;
pub use crate::ingest::types::{CandidateIdea, Source, SourceAdapter, StoredIdea};
pub use crate::ingest::{IngestReport, IngestStage, IngestSummary, Ingestor};
