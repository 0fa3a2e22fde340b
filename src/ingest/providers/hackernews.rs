// src/ingest/providers/hackernews.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::task::JoinSet;

use crate::ingest::providers::{ok_text, TOP_N};
use crate::ingest::types::{CandidateIdea, Source, SourceAdapter};

#[derive(Debug, Deserialize)]
pub struct Item {
    pub title: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Top stories from the Hacker News Firebase API.
pub struct HackerNewsAdapter {
    http: reqwest::Client,
    base_url: String,
    owner: Option<String>,
}

impl HackerNewsAdapter {
    pub fn new(http: reqwest::Client, owner: Option<String>) -> Self {
        Self {
            http,
            base_url: "https://hacker-news.firebaseio.com".to_string(),
            owner,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_item(http: reqwest::Client, url: String) -> Result<Option<Item>> {
        let rsp = http.get(&url).send().await.with_context(|| format!("GET {url}"))?;
        let body = ok_text(rsp, "hn item").await?;
        // Deleted items come back as `null`.
        serde_json::from_str(&body).context("parsing hn item json")
    }
}

/// First `TOP_N` ids of a `topstories.json` body.
pub fn parse_top_ids(body: &str) -> Result<Vec<u64>> {
    let mut ids: Vec<u64> = serde_json::from_str(body).context("parsing hn topstories json")?;
    ids.truncate(TOP_N);
    Ok(ids)
}

/// Stories without a title or external url (Ask HN, jobs) are skipped.
pub fn item_to_candidate(item: Item, owner: Option<&str>) -> Option<CandidateIdea> {
    let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
    let url = item.url.filter(|u| !u.is_empty())?;
    Some(CandidateIdea::new(
        Source::HackerNews,
        title,
        None,
        url,
        item.score.unwrap_or(0.0),
        owner.map(str::to_string),
    ))
}

#[async_trait]
impl SourceAdapter for HackerNewsAdapter {
    async fn fetch(&self) -> Result<Vec<CandidateIdea>> {
        let base = self.base_url.trim_end_matches('/');
        let url = format!("{base}/v0/topstories.json");
        let rsp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let ids = parse_top_ids(&ok_text(rsp, "hn topstories").await?)?;

        let mut tasks = JoinSet::new();
        for (idx, id) in ids.iter().enumerate() {
            let http = self.http.clone();
            let item_url = format!("{base}/v0/item/{id}.json");
            tasks.spawn(async move { (idx, Self::fetch_item(http, item_url).await) });
        }

        let mut items: Vec<(usize, Item)> = Vec::with_capacity(ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(Some(item)))) => items.push((idx, item)),
                Ok((_, Ok(None))) => {}
                Ok((idx, Err(e))) => {
                    tracing::warn!(id = ids[idx], error = %format!("{e:#}"), "hn item skipped");
                }
                Err(e) => tracing::warn!(error = %e, "hn item task failed"),
            }
        }
        items.sort_by_key(|(idx, _)| *idx);

        Ok(items
            .into_iter()
            .filter_map(|(_, item)| item_to_candidate(item, self.owner.as_deref()))
            .collect())
    }

    fn source(&self) -> Source {
        Source::HackerNews
    }
}
