// src/store/supabase.rs
use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::IdeaStore;
use crate::ingest::types::{Source, StoredIdea};

/// Rows requested per page when listing. PostgREST caps every response at
/// the project's `max-rows` (1000 on Supabase by default).
pub const PAGE_SIZE: usize = 1000;

/// Supabase table accessed through its PostgREST endpoint.
pub struct SupabaseStore {
    http: Client,
    endpoint: String,
    key: String,
    page_size: usize,
}

#[derive(Deserialize)]
struct LinkRow {
    normalized_link: String,
}

impl SupabaseStore {
    pub fn new(http: Client, base_url: &str, key: &str, table: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            key: key.to_string(),
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Accept", "application/json")
    }
}

/// PostgREST `in.(...)` list with every value double-quoted, so commas and
/// parentheses inside URLs do not split the list.
pub(crate) fn in_filter(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

#[async_trait::async_trait]
impl IdeaStore for SupabaseStore {
    async fn existing_links(
        &self,
        source: Source,
        normalized_links: &[String],
    ) -> Result<HashSet<String>> {
        if normalized_links.is_empty() {
            return Ok(HashSet::new());
        }
        let rsp = self
            .authed(self.http.get(&self.endpoint))
            .query(&[
                ("select", "normalized_link".to_string()),
                ("source", format!("eq.{}", source.as_str())),
                ("normalized_link", in_filter(normalized_links)),
            ])
            .send()
            .await
            .context("supabase existence query")?
            .error_for_status()
            .context("supabase existence query status")?;
        let rows: Vec<LinkRow> = rsp.json().await.context("decoding existence rows")?;
        Ok(rows.into_iter().map(|r| r.normalized_link).collect())
    }

    async fn insert_batch(&self, ideas: &[StoredIdea]) -> Result<Vec<StoredIdea>> {
        let rsp = self
            .authed(self.http.post(&self.endpoint))
            .header("Prefer", "return=representation")
            .json(ideas)
            .send()
            .await
            .context("supabase insert")?;
        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(anyhow!("supabase insert returned {status}: {body}"));
        }
        rsp.json().await.context("decoding inserted rows")
    }

    /// Walks the table page by page with `limit`/`offset` until an empty
    /// page. A short page does not end the walk: the server may cap pages
    /// below `page_size`.
    async fn list(&self, source: Option<Source>) -> Result<Vec<StoredIdea>> {
        let mut all: Vec<StoredIdea> = Vec::new();
        loop {
            let mut query = vec![
                ("select", "*".to_string()),
                ("order", "ingested_at.asc,id.asc".to_string()),
                ("limit", self.page_size.to_string()),
                ("offset", all.len().to_string()),
            ];
            if let Some(s) = source {
                query.push(("source", format!("eq.{}", s.as_str())));
            }
            let page: Vec<StoredIdea> = self
                .authed(self.http.get(&self.endpoint))
                .query(&query)
                .send()
                .await
                .context("supabase list")?
                .error_for_status()
                .context("supabase list status")?
                .json()
                .await
                .context("decoding idea rows")?;
            if page.is_empty() {
                break;
            }
            tracing::debug!(offset = all.len(), rows = page.len(), "supabase list page");
            all.extend(page);
        }
        Ok(all)
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}
