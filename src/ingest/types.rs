// src/ingest/types.rs
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External content provider an idea was fetched from.
///
/// Each variant plays one role: Reddit is the forum, Hacker News the
/// news aggregator, Product Hunt the launch directory and Indie Hackers
/// the maker community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    HackerNews,
    ProductHunt,
    IndieHackers,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Reddit,
        Source::HackerNews,
        Source::ProductHunt,
        Source::IndieHackers,
    ];

    /// Stable slug used in routes, store partitions and serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Reddit => "reddit",
            Source::HackerNews => "hackernews",
            Source::ProductHunt => "producthunt",
            Source::IndieHackers => "indiehackers",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Reddit => "Reddit",
            Source::HackerNews => "Hacker News",
            Source::ProductHunt => "Product Hunt",
            Source::IndieHackers => "Indie Hackers",
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Source::Reddit => "forum",
            Source::HackerNews => "news-aggregator",
            Source::ProductHunt => "launch-directory",
            Source::IndieHackers => "maker-community",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source '{0}'")]
pub struct UnknownSource(pub String);

impl FromStr for Source {
    type Err = UnknownSource;

    /// Accepts the slug, the role name or the display name, ignoring case
    /// and separators (`Hacker News`, `hacker-news`, `news_aggregator`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "reddit" | "forum" => Ok(Source::Reddit),
            "hackernews" | "hn" | "newsaggregator" => Ok(Source::HackerNews),
            "producthunt" | "ph" | "launchdirectory" => Ok(Source::ProductHunt),
            "indiehackers" | "ih" | "makercommunity" => Ok(Source::IndieHackers),
            _ => Err(UnknownSource(s.to_string())),
        }
    }
}

/// An idea freshly fetched from a provider, not yet deduplicated or stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateIdea {
    pub title: String,
    pub description: String,
    pub link: String,
    pub votes: f64,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl CandidateIdea {
    /// Builds a candidate, falling back to the title when the provider has
    /// no description and clamping negative vote counts to zero.
    pub fn new(
        source: Source,
        title: impl Into<String>,
        description: Option<String>,
        link: impl Into<String>,
        votes: f64,
        owner: Option<String>,
    ) -> Self {
        let title = title.into();
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| title.clone());
        let votes = if votes.is_finite() && votes > 0.0 {
            votes
        } else {
            0.0
        };
        Self {
            title,
            description,
            link: link.into(),
            votes,
            source,
            owner,
        }
    }
}

/// A persisted idea. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIdea {
    pub title: String,
    pub description: String,
    pub link: String,
    pub votes: f64,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub normalized_link: String,
    pub ingested_at: DateTime<Utc>,
}

impl StoredIdea {
    pub fn from_candidate(
        candidate: &CandidateIdea,
        normalized_link: String,
        ingested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            link: candidate.link.clone(),
            votes: candidate.votes,
            source: candidate.source,
            owner: candidate.owner.clone(),
            normalized_link,
            ingested_at,
        }
    }
}

/// Translation boundary between one provider and `CandidateIdea`.
///
/// Implementations hold no state between calls and may be invoked
/// concurrently for different sources.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CandidateIdea>>;
    fn source(&self) -> Source;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parses_slug_role_and_display_name() {
        assert_eq!("reddit".parse::<Source>().unwrap(), Source::Reddit);
        assert_eq!("forum".parse::<Source>().unwrap(), Source::Reddit);
        assert_eq!("Hacker News".parse::<Source>().unwrap(), Source::HackerNews);
        assert_eq!(
            "news-aggregator".parse::<Source>().unwrap(),
            Source::HackerNews
        );
        assert_eq!(
            "LAUNCH_DIRECTORY".parse::<Source>().unwrap(),
            Source::ProductHunt
        );
        assert_eq!(
            "indiehackers".parse::<Source>().unwrap(),
            Source::IndieHackers
        );
        assert!("twitter".parse::<Source>().is_err());
    }

    #[test]
    fn source_serializes_as_slug() {
        let s = serde_json::to_string(&Source::HackerNews).unwrap();
        assert_eq!(s, r#""hackernews""#);
        for src in Source::ALL {
            let back: Source = serde_json::from_str(&format!("\"{}\"", src.as_str())).unwrap();
            assert_eq!(back, src);
        }
    }

    #[test]
    fn candidate_defaults_description_and_votes() {
        let c = CandidateIdea::new(
            Source::IndieHackers,
            "Ship it",
            Some("   ".into()),
            "https://x",
            -3.0,
            None,
        );
        assert_eq!(c.description, "Ship it");
        assert_eq!(c.votes, 0.0);
    }
}
