//! Persistent store boundary: a batched existence check, a batched insert
//! and a read-only listing for the API. Nothing is ever updated or deleted.

pub mod file;
pub mod memory;
pub mod supabase;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::config::{StoreBackend, StoreConfig};
use crate::ingest::types::{Source, StoredIdea};

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

#[async_trait::async_trait]
pub trait IdeaStore: Send + Sync {
    /// Returns the subset of `normalized_links` already stored for `source`.
    /// One round trip regardless of how many links are asked about.
    async fn existing_links(
        &self,
        source: Source,
        normalized_links: &[String],
    ) -> Result<HashSet<String>>;

    /// Appends `ideas` in one request and returns the rows the store reports
    /// as written. An empty return means nothing was written.
    async fn insert_batch(&self, ideas: &[StoredIdea]) -> Result<Vec<StoredIdea>>;

    /// All stored ideas, or only those of one source, oldest first.
    async fn list(&self, source: Option<Source>) -> Result<Vec<StoredIdea>>;

    fn backend(&self) -> &'static str;
}

pub type DynIdeaStore = Arc<dyn IdeaStore>;

/// Builds the configured backend.
pub fn build_store(cfg: &StoreConfig, http: reqwest::Client) -> Result<DynIdeaStore> {
    let store: DynIdeaStore = match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(JsonFileStore::new(&cfg.file_path)),
        StoreBackend::Supabase => {
            let (Some(url), Some(key)) = (cfg.supabase_url.as_deref(), cfg.supabase_key.as_deref())
            else {
                bail!("STORE_BACKEND=supabase requires SUPABASE_URL and SUPABASE_KEY");
            };
            Arc::new(SupabaseStore::new(http, url, key, &cfg.table))
        }
    };
    tracing::info!(backend = store.backend(), "idea store ready");
    Ok(store)
}
