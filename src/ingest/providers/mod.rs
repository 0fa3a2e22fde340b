// src/ingest/providers/mod.rs
pub mod hackernews;
pub mod indiehackers;
pub mod producthunt;
pub mod reddit;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::config::{HttpConfig, ProvidersConfig};
use crate::ingest::types::{Source, SourceAdapter};

pub use hackernews::HackerNewsAdapter;
pub use indiehackers::IndieHackersAdapter;
pub use producthunt::ProductHuntAdapter;
pub use reddit::RedditAdapter;

/// Listing size for Hacker News and Product Hunt. Reddit asks for
/// `reddit::LISTING_LIMIT` posts and Indie Hackers keeps the first
/// `indiehackers::FEED_LIMIT` entries of its feed page.
pub const TOP_N: usize = 10;

pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; idea-inbox/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// One client for all adapters; every request inherits the timeouts.
pub fn http_client(cfg: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()
        .context("building http client")
}

/// Adapter for `source`, wired from configuration.
pub fn build_adapter(
    source: Source,
    http: reqwest::Client,
    providers: &ProvidersConfig,
    owner: Option<String>,
) -> Arc<dyn SourceAdapter> {
    match source {
        Source::Reddit => Arc::new(RedditAdapter::new(
            http,
            providers.reddit_subreddit.clone(),
            owner,
        )),
        Source::HackerNews => Arc::new(HackerNewsAdapter::new(http, owner)),
        Source::ProductHunt => Arc::new(ProductHuntAdapter::new(
            http,
            providers.producthunt_api_key.clone(),
            owner,
        )),
        Source::IndieHackers => Arc::new(IndieHackersAdapter::new(http, owner)),
    }
}

/// Body of a successful response; any other status is an error.
pub(crate) async fn ok_text(rsp: reqwest::Response, what: &str) -> Result<String> {
    let status = rsp.status();
    if !status.is_success() {
        bail!("{what} returned {status}");
    }
    rsp.text().await.with_context(|| format!("{what} body"))
}
