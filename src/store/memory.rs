use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard};

use anyhow::{anyhow, Result};

use super::IdeaStore;
use crate::ingest::types::{Source, StoredIdea};

/// In-process store, used by tests and `STORE_BACKEND=memory`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<StoredIdea>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<StoredIdea>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<StoredIdea>>> {
        self.rows.read().map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

#[async_trait::async_trait]
impl IdeaStore for MemoryStore {
    async fn existing_links(
        &self,
        source: Source,
        normalized_links: &[String],
    ) -> Result<HashSet<String>> {
        let wanted: HashSet<&str> = normalized_links.iter().map(String::as_str).collect();
        let rows = self.read()?;
        Ok(rows
            .iter()
            .filter(|r| r.source == source && wanted.contains(r.normalized_link.as_str()))
            .map(|r| r.normalized_link.clone())
            .collect())
    }

    async fn insert_batch(&self, ideas: &[StoredIdea]) -> Result<Vec<StoredIdea>> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        rows.extend_from_slice(ideas);
        Ok(ideas.to_vec())
    }

    async fn list(&self, source: Option<Source>) -> Result<Vec<StoredIdea>> {
        let rows = self.read()?;
        Ok(rows
            .iter()
            .filter(|r| source.is_none() || source == Some(r.source))
            .cloned()
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
