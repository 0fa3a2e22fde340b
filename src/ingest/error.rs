// src/ingest/error.rs
use serde::{Serialize, Serializer};

use crate::ingest::types::Source;

/// Failure kinds an ingestion run can end with. None of them escape the
/// orchestrator; they are carried in the run summary instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("fetch from {provider} failed: {message}")]
    Fetch { provider: Source, message: String },

    #[error("duplicate check for {provider} failed: {message}")]
    StoreQuery { provider: Source, message: String },

    #[error("persisting {count} ideas for {provider} failed after {attempts} attempts")]
    StoreWrite {
        provider: Source,
        count: usize,
        attempts: u32,
    },
}

impl IngestError {
    pub fn fetch(source: Source, err: &anyhow::Error) -> Self {
        IngestError::Fetch {
            provider: source,
            message: format!("{err:#}"),
        }
    }

    pub fn store_query(source: Source, err: &anyhow::Error) -> Self {
        IngestError::StoreQuery {
            provider: source,
            message: format!("{err:#}"),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Fetch { .. } => "fetch_error",
            IngestError::StoreQuery { .. } => "store_query_error",
            IngestError::StoreWrite { .. } => "store_write_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorOut<'a> {
    kind: &'a str,
    message: String,
}

impl Serialize for IngestError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ErrorOut {
            kind: self.kind(),
            message: self.to_string(),
        }
        .serialize(serializer)
    }
}
