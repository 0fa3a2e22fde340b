// src/ingest/mod.rs
pub mod dedup;
pub mod error;
pub mod normalize;
pub mod persist;
pub mod providers;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::ingest::error::IngestError;
use crate::ingest::persist::{BatchPersister, PersistResult};
use crate::ingest::types::{CandidateIdea, Source, SourceAdapter};
use crate::retry::Backoff;
use crate::store::DynIdeaStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Ingestion runs started, per source.");
        describe_counter!("ingest_fetched_total", "Candidates returned by adapters.");
        describe_counter!("ingest_new_total", "Candidates judged new by the duplicate filter.");
        describe_counter!(
            "ingest_duplicate_total",
            "Candidates dropped as already stored or repeated within a batch."
        );
        describe_counter!("ingest_inserted_total", "Ideas written to the store.");
        describe_counter!("ingest_fetch_errors_total", "Adapter fetch/parse failures.");
        describe_counter!(
            "ingest_store_query_errors_total",
            "Failed duplicate-check queries."
        );
        describe_counter!(
            "ingest_persist_failures_total",
            "Batches not persisted after all retries."
        );
        describe_counter!("ingest_persist_attempts_total", "Batch insert attempts.");
        describe_histogram!("ingest_fetch_ms", "Adapter fetch time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingestion last finished.");
    });
}

/// Where an ingestion run is. `Done` and `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Fetching,
    Normalizing,
    Filtering,
    Persisting,
    Done,
    Errored,
}

impl IngestStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestStage::Done | IngestStage::Errored)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub source: Source,
    pub state: IngestStage,
    pub fetched: usize,
    pub new: usize,
    pub duplicate: usize,
    /// New candidates that did not make it into the store.
    pub failed: usize,
    pub inserted: usize,
    pub persisted: bool,
    pub attempts: u32,
    pub error: Option<IngestError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestSummary {
    fn start(source: Source) -> Self {
        let now = Utc::now();
        Self {
            source,
            state: IngestStage::Fetching,
            fetched: 0,
            new: 0,
            duplicate: 0,
            failed: 0,
            inserted: 0,
            persisted: false,
            attempts: 0,
            error: None,
            started_at: now,
            finished_at: now,
        }
    }
}

/// Result of one run: the summary plus what the adapter fetched.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub summary: IngestSummary,
    pub ideas: Vec<CandidateIdea>,
}

/// Sequences fetch → normalize → filter → persist for one source.
///
/// Holds no per-run state, so one instance can serve concurrent runs for
/// different sources.
#[derive(Clone)]
pub struct Ingestor {
    store: DynIdeaStore,
    persister: BatchPersister,
    max_attempts: u32,
}

impl Ingestor {
    pub fn new(store: DynIdeaStore, max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            persister: BatchPersister::new(store.clone(), backoff),
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn store(&self) -> &DynIdeaStore {
        &self.store
    }

    pub async fn run(&self, adapter: &dyn SourceAdapter) -> IngestReport {
        ensure_metrics_described();
        let source = adapter.source();
        let label = source.as_str();
        let mut summary = IngestSummary::start(source);
        counter!("ingest_runs_total", "source" => label).increment(1);
        tracing::info!(%source, "ingestion started");

        // FETCHING
        let t0 = std::time::Instant::now();
        let fetched = adapter.fetch().await;
        histogram!("ingest_fetch_ms", "source" => label).record(t0.elapsed().as_secs_f64() * 1_000.0);
        let candidates = match fetched {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(%source, error = %format!("{e:#}"), "fetch failed");
                counter!("ingest_fetch_errors_total", "source" => label).increment(1);
                summary.error = Some(IngestError::fetch(source, &e));
                return finish(summary, IngestStage::Errored, Vec::new());
            }
        };
        summary.fetched = candidates.len();
        counter!("ingest_fetched_total", "source" => label).increment(candidates.len() as u64);

        // NORMALIZING: link normalization cannot fail; it runs inside the
        // filter and again when records are stamped for commit.
        summary.state = advance(source, summary.state, IngestStage::Normalizing);
        summary.state = advance(source, summary.state, IngestStage::Filtering);

        // FILTERING
        let fresh = match dedup::filter_new(self.store.as_ref(), candidates.clone(), source).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(%source, error = %e, "duplicate check failed; nothing persisted");
                counter!("ingest_store_query_errors_total", "source" => label).increment(1);
                summary.error = Some(e);
                return finish(summary, IngestStage::Errored, candidates);
            }
        };
        summary.new = fresh.len();
        summary.duplicate = summary.fetched - fresh.len();
        counter!("ingest_new_total", "source" => label).increment(fresh.len() as u64);
        counter!("ingest_duplicate_total", "source" => label).increment(summary.duplicate as u64);

        // PERSISTING
        summary.state = advance(source, summary.state, IngestStage::Persisting);
        if fresh.is_empty() {
            tracing::info!(%source, fetched = summary.fetched, "all ideas are duplicates; nothing to insert");
        }
        let PersistResult {
            inserted_count,
            ok,
            attempts,
        } = self.persister.commit(&fresh, source, self.max_attempts).await;
        summary.inserted = inserted_count;
        summary.persisted = ok;
        summary.attempts = attempts;
        summary.failed = fresh.len().saturating_sub(inserted_count);
        if !ok {
            summary.error = Some(IngestError::StoreWrite {
                provider: source,
                count: fresh.len(),
                attempts,
            });
        }
        counter!("ingest_inserted_total", "source" => label).increment(inserted_count as u64);

        finish(summary, IngestStage::Done, candidates)
    }
}

fn advance(source: Source, from: IngestStage, to: IngestStage) -> IngestStage {
    tracing::debug!(%source, ?from, ?to, "ingest stage");
    to
}

fn finish(mut summary: IngestSummary, state: IngestStage, ideas: Vec<CandidateIdea>) -> IngestReport {
    summary.state = advance(summary.source, summary.state, state);
    summary.finished_at = Utc::now();
    gauge!("ingest_last_run_ts", "source" => summary.source.as_str())
        .set(summary.finished_at.timestamp() as f64);
    tracing::info!(
        source = %summary.source,
        state = ?summary.state,
        fetched = summary.fetched,
        new = summary.new,
        duplicate = summary.duplicate,
        inserted = summary.inserted,
        persisted = summary.persisted,
        "ingestion finished"
    );
    IngestReport { summary, ideas }
}
