// src/ingest/persist.rs
use anyhow::anyhow;
use chrono::Utc;
use metrics::counter;
use serde::Serialize;

use crate::ingest::normalize::normalize_link;
use crate::ingest::types::{CandidateIdea, Source, StoredIdea};
use crate::retry::{Backoff, RetryPolicy};
use crate::store::DynIdeaStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersistResult {
    pub inserted_count: usize,
    pub ok: bool,
    pub attempts: u32,
}

/// Commits new ideas as one batch, retrying the whole batch on failure.
///
/// At-least-once at batch granularity: if the store half-applied a failed
/// batch, the retry may write some rows again.
#[derive(Clone)]
pub struct BatchPersister {
    store: DynIdeaStore,
    backoff: Backoff,
}

impl BatchPersister {
    pub fn new(store: DynIdeaStore, backoff: Backoff) -> Self {
        Self { store, backoff }
    }

    pub async fn commit(
        &self,
        candidates: &[CandidateIdea],
        source: Source,
        max_attempts: u32,
    ) -> PersistResult {
        if candidates.is_empty() {
            return PersistResult {
                inserted_count: 0,
                ok: true,
                attempts: 0,
            };
        }

        let policy = RetryPolicy::new(max_attempts, self.backoff);
        let outcome = policy
            .run(|attempt| {
                // Stamp right before each attempt so ingested_at reflects commit time.
                let now = Utc::now();
                let records: Vec<StoredIdea> = candidates
                    .iter()
                    .map(|c| {
                        let mut r = StoredIdea::from_candidate(c, normalize_link(&c.link), now);
                        r.source = source;
                        r
                    })
                    .collect();
                counter!("ingest_persist_attempts_total", "source" => source.as_str()).increment(1);
                let store = self.store.clone();
                async move {
                    tracing::debug!(%source, attempt, count = records.len(), "batch insert");
                    let written = store.insert_batch(&records).await?;
                    if written.is_empty() {
                        return Err(anyhow!("store acknowledged no rows"));
                    }
                    Ok::<usize, anyhow::Error>(written.len())
                }
            })
            .await;

        match outcome {
            Ok(done) => {
                tracing::info!(%source, inserted = done.value, attempts = done.attempts, "ideas persisted");
                PersistResult {
                    inserted_count: done.value,
                    ok: true,
                    attempts: done.attempts,
                }
            }
            Err(exhausted) => {
                tracing::error!(
                    %source,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "max retries reached; ideas not persisted"
                );
                counter!("ingest_persist_failures_total", "source" => source.as_str()).increment(1);
                PersistResult {
                    inserted_count: 0,
                    ok: false,
                    attempts: exhausted.attempts,
                }
            }
        }
    }
}
