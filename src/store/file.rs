// src/store/file.rs
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use super::IdeaStore;
use crate::ingest::types::{Source, StoredIdea};

/// On-disk layout: one array of ideas per source slug.
type Vault = BTreeMap<String, Vec<StoredIdea>>;

/// Local JSON vault (`{"reddit": [...], "hackernews": [...]}`).
///
/// Read-modify-write cycles are serialized within the process; writes go
/// through a temp file and a rename so a crash never leaves half a file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vault> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) if s.trim().is_empty() => Ok(Vault::new()),
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing idea vault {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vault::new()),
            Err(e) => {
                Err(e).with_context(|| format!("reading idea vault {}", self.path.display()))
            }
        }
    }

    async fn save(&self, vault: &Vault) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = serde_json::to_vec_pretty(vault).context("serializing idea vault")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl IdeaStore for JsonFileStore {
    async fn existing_links(
        &self,
        source: Source,
        normalized_links: &[String],
    ) -> Result<HashSet<String>> {
        let _guard = self.lock.lock().await;
        let vault = self.load().await?;
        let wanted: HashSet<&str> = normalized_links.iter().map(String::as_str).collect();
        Ok(vault
            .get(source.as_str())
            .into_iter()
            .flatten()
            .filter(|r| wanted.contains(r.normalized_link.as_str()))
            .map(|r| r.normalized_link.clone())
            .collect())
    }

    async fn insert_batch(&self, ideas: &[StoredIdea]) -> Result<Vec<StoredIdea>> {
        if ideas.is_empty() {
            return Ok(Vec::new());
        }
        let _guard = self.lock.lock().await;
        let mut vault = self.load().await?;
        for idea in ideas {
            vault
                .entry(idea.source.as_str().to_string())
                .or_default()
                .push(idea.clone());
        }
        self.save(&vault).await?;
        tracing::debug!(path = %self.path.display(), count = ideas.len(), "ideas appended to vault");
        Ok(ideas.to_vec())
    }

    async fn list(&self, source: Option<Source>) -> Result<Vec<StoredIdea>> {
        let _guard = self.lock.lock().await;
        let vault = self.load().await?;
        let mut out: Vec<StoredIdea> = match source {
            Some(s) => vault.get(s.as_str()).cloned().unwrap_or_default(),
            None => vault.into_values().flatten().collect(),
        };
        out.sort_by_key(|r| r.ingested_at);
        Ok(out)
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
