// src/ingest/dedup.rs
use std::collections::HashSet;

use crate::ingest::error::IngestError;
use crate::ingest::normalize::normalize_link;
use crate::ingest::types::{CandidateIdea, Source};
use crate::store::IdeaStore;

/// Keeps the first candidate of each normalized link within one batch.
/// Returns the survivors and how many were collapsed.
pub fn dedup_within_batch(candidates: Vec<CandidateIdea>) -> (Vec<CandidateIdea>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
    let mut keep = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;
    for c in candidates {
        if seen.insert(normalize_link(&c.link)) {
            keep.push(c);
        } else {
            dropped += 1;
        }
    }
    (keep, dropped)
}

/// Returns the candidates whose normalized link is not yet stored for
/// `source`, after collapsing variants of the same link inside the batch.
///
/// Uses a single batched existence query. If that query fails nothing is
/// treated as new.
pub async fn filter_new(
    store: &dyn IdeaStore,
    candidates: Vec<CandidateIdea>,
    source: Source,
) -> Result<Vec<CandidateIdea>, IngestError> {
    let (unique, collapsed) = dedup_within_batch(candidates);
    if unique.is_empty() {
        return Ok(unique);
    }

    let links: Vec<String> = unique.iter().map(|c| normalize_link(&c.link)).collect();
    let existing = store
        .existing_links(source, &links)
        .await
        .map_err(|e| IngestError::store_query(source, &e))?;

    let fresh: Vec<CandidateIdea> = unique
        .into_iter()
        .zip(links)
        .filter(|(_, link)| !existing.contains(link))
        .map(|(c, _)| c)
        .collect();

    tracing::debug!(
        %source,
        collapsed,
        already_stored = existing.len(),
        fresh = fresh.len(),
        "duplicate filter applied"
    );
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(title: &str, link: &str) -> CandidateIdea {
        CandidateIdea::new(Source::Reddit, title, None, link, 0.0, None)
    }

    #[test]
    fn first_variant_wins_inside_a_batch() {
        let (keep, dropped) = dedup_within_batch(vec![
            cand("A", "http://x.com/p/"),
            cand("B", "HTTP://X.COM/p"),
            cand("C", "http://x.com/other"),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(keep.len(), 2);
        assert_eq!(keep[0].title, "A");
        assert_eq!(keep[0].link, "http://x.com/p/", "raw link is preserved");
    }
}
