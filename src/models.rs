//! Data models for discovered articles and the published-links ledger.
//!
//! Three records flow through the pipeline:
//! - [`Candidate`]: an article reference discovered from a feed or listing
//!   page, not yet published
//! - [`Extraction`]: the result of pulling full text and an image out of one
//!   article page
//! - [`PostedRecord`]: one durable entry in the published-links ledger,
//!   created only after a confirmed successful publish

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discovered, not-yet-published article reference.
///
/// Produced by the source adapters and consumed by the run orchestrator.
/// Within one run candidates are unique by `link` after the merge step.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Headline as reported by the feed or listing page. May be empty;
    /// downstream falls back to the extracted title, then a fixed default.
    pub title: String,
    /// Canonical article URL. The dedupe key; never empty after merge.
    pub link: String,
    /// Markup-stripped excerpt. Often empty for HTML-sourced items.
    pub summary: String,
    /// Source-claimed publish time. Absent for most HTML-sourced items;
    /// the recency filter may recover one from the article page instead.
    pub published: Option<DateTime<Utc>>,
    /// URL of the feed or listing page this candidate came from. Used for
    /// the per-source post cap.
    pub source_id: String,
}

/// What came out of one article page.
///
/// Any field may be empty when the extraction strategies fail; the caller
/// substitutes the feed-provided title and summary.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub title: String,
    pub text: String,
    pub image: Option<String>,
}

/// One durable entry in the published-links ledger.
///
/// Append-only: created after a confirmed publish, never updated, never
/// deleted. Owned exclusively by [`crate::dedup::DedupStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedRecord {
    /// SHA-256 hex digest of the trimmed link. Stable across runs.
    pub id: String,
    pub link: String,
    pub title: String,
    /// Publish time as claimed by the source, when it carried one.
    pub published_at: Option<DateTime<Utc>>,
    /// Wall-clock time the record was written.
    pub recorded_at: DateTime<Utc>,
}
