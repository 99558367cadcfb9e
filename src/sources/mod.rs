//! Source adapters: turn a configured source into candidate items.
//!
//! Every source goes through the same auto-detection: fetch once, try to
//! parse as a syndication feed, and fall back to HTML listing extraction
//! when that yields nothing. A source that fails entirely produces an error
//! the orchestrator logs and skips — one broken source never aborts
//! discovery across the others.

pub mod listing;
pub mod rss;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::config::SourceDescriptor;
use crate::fetch::{FetchError, Fetcher};
use crate::models::Candidate;

/// Discover candidate items from one source.
///
/// Fetches the descriptor URL once; the body is first offered to the feed
/// parser and, if it is not a feed, re-read as an HTML listing page. The
/// configured keyword filter is applied before returning.
#[instrument(level = "info", skip_all, fields(source = %descriptor.url))]
pub async fn discover(
    fetcher: &Fetcher,
    descriptor: &SourceDescriptor,
    keywords: &[String],
) -> Result<Vec<Candidate>, FetchError> {
    let bytes = fetcher.get_bytes(&descriptor.url).await?;

    let items = match rss::parse_feed(&bytes, &descriptor.url) {
        Some(entries) => {
            debug!(count = entries.len(), "Source classified as feed");
            entries
        }
        None => {
            let html = String::from_utf8_lossy(&bytes);
            let base = descriptor.base.as_deref().unwrap_or(&descriptor.url);
            let entries =
                listing::extract_listing(&html, base, descriptor.section.as_deref(), &descriptor.url);
            debug!(count = entries.len(), "Source classified as HTML listing");
            entries
        }
    };

    Ok(apply_keyword_filter(items, keywords))
}

/// Retain items whose title or summary contains at least one keyword,
/// case-insensitively. An empty keyword list keeps everything.
///
/// Keywords are expected lowercased (see [`crate::config::Sources::load`]).
pub fn apply_keyword_filter(items: Vec<Candidate>, keywords: &[String]) -> Vec<Candidate> {
    if keywords.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| {
            let blob = format!("{} {}", item.title, item.summary).to_lowercase();
            keywords.iter().any(|k| blob.contains(k.as_str()))
        })
        .collect()
}

/// Merge candidates gathered across all sources.
///
/// Items with an empty link are dropped; duplicate links are resolved
/// first-seen-wins, so the earlier-configured source keeps the item.
pub fn merge_candidates(items: Vec<Candidate>) -> Vec<Candidate> {
    items
        .into_iter()
        .filter(|item| !item.link.trim().is_empty())
        .unique_by(|item| item.link.clone())
        .collect()
}
