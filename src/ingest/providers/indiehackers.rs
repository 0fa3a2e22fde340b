// src/ingest/providers/indiehackers.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::providers::ok_text;
use crate::ingest::types::{CandidateIdea, Source, SourceAdapter};

pub const SITE: &str = "https://www.indiehackers.com";
/// Entries kept from one feed page.
pub const FEED_LIMIT: usize = 30;

static RE_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\s([^>]*)>(.*?)</a>").expect("anchor regex"));
static RE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*["'][^"']*\btitle-link\b[^"']*["']"#).expect("class regex")
});
static RE_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']+)["']"#).expect("href regex"));
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Latest posts scraped from the Indie Hackers feed page.
pub struct IndieHackersAdapter {
    http: reqwest::Client,
    base_url: String,
    owner: Option<String>,
}

impl IndieHackersAdapter {
    pub fn new(http: reqwest::Client, owner: Option<String>) -> Self {
        Self {
            http,
            base_url: SITE.to_string(),
            owner,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn clean_title(inner: &str) -> String {
    let no_tags = RE_TAGS.replace_all(inner, " ");
    let decoded = html_escape::decode_html_entities(&no_tags);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

fn absolute(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{SITE}{href}")
    } else {
        format!("{SITE}/{href}")
    }
}

/// Extracts the first `FEED_LIMIT` `a.title-link` anchors from the feed HTML.
/// The listing has no vote counts, so votes are zero and the title doubles
/// as description.
pub fn parse_feed(html: &str, owner: Option<&str>) -> Vec<CandidateIdea> {
    RE_ANCHOR
        .captures_iter(html)
        .filter(|cap| RE_CLASS.is_match(&cap[1]))
        .filter_map(|cap| {
            let href = RE_HREF.captures(&cap[1])?.get(1)?.as_str();
            let href = html_escape::decode_html_entities(href);
            let title = clean_title(&cap[2]);
            if title.is_empty() {
                return None;
            }
            Some(CandidateIdea::new(
                Source::IndieHackers,
                title,
                None,
                absolute(&href),
                0.0,
                owner.map(str::to_string),
            ))
        })
        .take(FEED_LIMIT)
        .collect()
}

#[async_trait]
impl SourceAdapter for IndieHackersAdapter {
    async fn fetch(&self) -> Result<Vec<CandidateIdea>> {
        let url = format!("{}/post", self.base_url.trim_end_matches('/'));
        let rsp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let html = ok_text(rsp, "indie hackers feed").await?;
        Ok(parse_feed(&html, self.owner.as_deref()))
    }

    fn source(&self) -> Source {
        Source::IndieHackers
    }
}
