// src/ingest/providers/producthunt.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::ingest::providers::{ok_text, TOP_N};
use crate::ingest::types::{CandidateIdea, Source, SourceAdapter};

pub const NO_DESCRIPTION: &str = "No description provided.";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Data {
    posts: Posts,
}

#[derive(Debug, Deserialize)]
struct Posts {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Node,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Node {
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(default)]
    votes_count: Option<f64>,
}

/// Most-voted launches via the Product Hunt v2 GraphQL API.
pub struct ProductHuntAdapter {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    owner: Option<String>,
}

impl ProductHuntAdapter {
    pub fn new(http: reqwest::Client, api_key: Option<String>, owner: Option<String>) -> Self {
        Self {
            http,
            endpoint: "https://api.producthunt.com/v2/api/graphql".to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            owner,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

pub fn top_posts_query() -> String {
    format!(
        "{{ posts(order: VOTES, first: {TOP_N}) {{ edges {{ node {{ name description url votesCount }} }} }} }}"
    )
}

/// Maps a GraphQL response body onto candidates. GraphQL-level errors fail
/// the whole fetch even when the HTTP status was 200.
pub fn parse_posts(body: &str, owner: Option<&str>) -> Result<Vec<CandidateIdea>> {
    let rsp: GraphQlResponse =
        serde_json::from_str(body).context("parsing product hunt graphql json")?;
    if !rsp.errors.is_empty() {
        let msgs: Vec<&str> = rsp.errors.iter().map(|e| e.message.as_str()).collect();
        bail!("product hunt graphql errors: {}", msgs.join("; "));
    }
    let data = rsp
        .data
        .ok_or_else(|| anyhow!("product hunt response has no data"))?;

    Ok(data
        .posts
        .edges
        .into_iter()
        .filter_map(|e| {
            let n = e.node;
            let title = n.name.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let url = n.url.filter(|u| !u.is_empty())?;
            let description = n
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string());
            Some(CandidateIdea::new(
                Source::ProductHunt,
                title,
                Some(description),
                url,
                n.votes_count.unwrap_or(0.0),
                owner.map(str::to_string),
            ))
        })
        .collect())
}

#[async_trait]
impl SourceAdapter for ProductHuntAdapter {
    async fn fetch(&self) -> Result<Vec<CandidateIdea>> {
        let Some(key) = self.api_key.as_deref() else {
            bail!("PH_API_KEY is not configured");
        };
        let rsp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(key)
            .header("Accept", "application/json")
            .json(&json!({ "query": top_posts_query() }))
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;
        let body = ok_text(rsp, "product hunt graphql").await?;
        parse_posts(&body, self.owner.as_deref())
    }

    fn source(&self) -> Source {
        Source::ProductHunt
    }
}
