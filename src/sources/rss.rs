//! Syndication feed ingestion.
//!
//! Parsing is tolerant by policy: whatever `feed-rs` can recover counts. A
//! document that parses and yields at least one entry is classified as a
//! feed, even if it was not strictly well-formed; anything else signals the
//! caller to fall back to HTML listing extraction.

use feed_rs::parser;
use tracing::debug;

use crate::models::Candidate;
use crate::utils::{clean_text, strip_markup};

/// Try to parse raw bytes as an RSS/Atom feed.
///
/// Returns `None` when the document is not a feed (parse failure or zero
/// entries) so the source adapter can fall back to listing extraction.
/// Entries with an empty link are skipped; the returned vector may therefore
/// be empty even for a genuine feed.
pub fn parse_feed(bytes: &[u8], source_url: &str) -> Option<Vec<Candidate>> {
    let feed = match parser::parse(bytes) {
        Ok(feed) => feed,
        Err(e) => {
            debug!(source = %source_url, error = %e, "Not parseable as a feed");
            return None;
        }
    };
    if feed.entries.is_empty() {
        debug!(source = %source_url, "Feed parsed but has no entries");
        return None;
    }

    let mut items = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let link = entry
            .links
            .iter()
            .map(|l| l.href.trim())
            .find(|href| !href.is_empty())
            .unwrap_or_default()
            .to_string();
        if link.is_empty() {
            continue;
        }

        let title = entry
            .title
            .map(|t| clean_text(&t.content))
            .unwrap_or_default();
        let summary = entry
            .summary
            .map(|s| strip_markup(&s.content))
            .unwrap_or_default();
        let published = entry.published.or(entry.updated);

        items.push(Candidate {
            title,
            link,
            summary,
            published,
            source_id: source_url.to_string(),
        });
    }
    Some(items)
}
