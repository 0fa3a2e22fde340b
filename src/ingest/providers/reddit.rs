// src/ingest/providers/reddit.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::providers::ok_text;
use crate::ingest::types::{CandidateIdea, Source, SourceAdapter};

/// Posts requested per listing; matches Reddit's default page size.
pub const LISTING_LIMIT: usize = 25;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    #[serde(default)]
    selftext: Option<String>,
    permalink: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

/// Newest posts of one subreddit (`r/startups` by default).
pub struct RedditAdapter {
    http: reqwest::Client,
    base_url: String,
    subreddit: String,
    owner: Option<String>,
}

impl RedditAdapter {
    pub fn new(http: reqwest::Client, subreddit: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            http,
            base_url: "https://www.reddit.com".to_string(),
            subreddit: subreddit.into(),
            owner,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Maps a `/new.json` listing body onto candidates.
pub fn parse_listing(body: &str, owner: Option<&str>) -> Result<Vec<CandidateIdea>> {
    let listing: Listing = serde_json::from_str(body).context("parsing reddit listing json")?;
    let out = listing
        .data
        .children
        .into_iter()
        .filter_map(|c| {
            let p = c.data;
            let title = p.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let permalink = p.permalink.filter(|l| !l.is_empty())?;
            Some(CandidateIdea::new(
                Source::Reddit,
                title,
                p.selftext,
                format!("https://www.reddit.com{permalink}"),
                p.score.unwrap_or(0.0),
                owner.map(str::to_string),
            ))
        })
        .collect();
    Ok(out)
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    async fn fetch(&self) -> Result<Vec<CandidateIdea>> {
        let url = format!(
            "{}/r/{}/new.json?limit={}",
            self.base_url.trim_end_matches('/'),
            self.subreddit,
            LISTING_LIMIT
        );
        let rsp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let body = ok_text(rsp, "reddit listing").await?;
        parse_listing(&body, self.owner.as_deref())
    }

    fn source(&self) -> Source {
        Source::Reddit
    }
}
