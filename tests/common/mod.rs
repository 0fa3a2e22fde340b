// tests/common/mod.rs
// Shared mocks for integration tests: a store that counts and can fail on
// demand, a fixed-output adapter, and a local HTTP server for fixtures.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};

use idea_inbox::store::{IdeaStore, MemoryStore};
use idea_inbox::{CandidateIdea, Source, SourceAdapter, StoredIdea};

#[derive(Default)]
pub struct MockStore {
    pub inner: MemoryStore,
    pub existence_calls: AtomicU32,
    pub insert_calls: AtomicU32,
    /// Number of upcoming inserts that fail before one succeeds.
    pub fail_next_inserts: AtomicU32,
    pub always_fail_inserts: AtomicBool,
    /// Report success with zero rows written.
    pub empty_inserts: AtomicBool,
    pub fail_queries: AtomicBool,
    pub fail_list: AtomicBool,
    /// `ingested_at` of every attempted batch, in call order.
    pub attempt_stamps: Mutex<Vec<Vec<DateTime<Utc>>>>,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seeded(rows: Vec<StoredIdea>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::with_rows(rows),
            ..Self::default()
        })
    }

    pub fn existence(&self) -> u32 {
        self.existence_calls.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> u32 {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub async fn rows(&self) -> Vec<StoredIdea> {
        self.inner.list(None).await.unwrap()
    }
}

#[async_trait]
impl IdeaStore for MockStore {
    async fn existing_links(&self, source: Source, links: &[String]) -> Result<HashSet<String>> {
        self.existence_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(anyhow!("store unreachable"));
        }
        self.inner.existing_links(source, links).await
    }

    async fn insert_batch(&self, ideas: &[StoredIdea]) -> Result<Vec<StoredIdea>> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.attempt_stamps
            .lock()
            .unwrap()
            .push(ideas.iter().map(|i| i.ingested_at).collect());
        if self.always_fail_inserts.load(Ordering::SeqCst) {
            return Err(anyhow!("insert rejected"));
        }
        let pending = self.fail_next_inserts.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next_inserts.store(pending - 1, Ordering::SeqCst);
            return Err(anyhow!("transient insert failure"));
        }
        if self.empty_inserts.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        self.inner.insert_batch(ideas).await
    }

    async fn list(&self, source: Option<Source>) -> Result<Vec<StoredIdea>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(anyhow!("store unreachable"));
        }
        self.inner.list(source).await
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

/// Adapter that returns a fixed batch, or a fixed error.
pub struct FixedAdapter {
    pub source: Source,
    pub result: std::result::Result<Vec<CandidateIdea>, String>,
    pub calls: AtomicU32,
}

impl FixedAdapter {
    pub fn ok(source: Source, ideas: Vec<CandidateIdea>) -> Self {
        Self {
            source,
            result: Ok(ideas),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing(source: Source, msg: &str) -> Self {
        Self {
            source,
            result: Err(msg.to_string()),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl SourceAdapter for FixedAdapter {
    async fn fetch(&self) -> Result<Vec<CandidateIdea>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(v) => Ok(v.clone()),
            Err(m) => Err(anyhow!(m.clone())),
        }
    }

    fn source(&self) -> Source {
        self.source
    }
}

pub fn idea(source: Source, title: &str, link: &str) -> CandidateIdea {
    CandidateIdea::new(source, title, None, link, 0.0, None)
}

pub fn stored(source: Source, normalized_link: &str) -> StoredIdea {
    StoredIdea::from_candidate(
        &idea(source, "seed", normalized_link),
        normalized_link.to_string(),
        Utc::now(),
    )
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Accepts connections and never answers, so clients hit their timeout.
pub async fn black_hole() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    format!("http://{addr}")
}

pub fn fast_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(300))
        .build()
        .unwrap()
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}")).expect("fixture")
}
