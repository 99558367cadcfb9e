//! Recency filtering.
//!
//! A candidate passes when its publish time falls inside the configured
//! freshness window. Feed entries carry parsed timestamps already; HTML
//! listing items usually do not, so the filter may recover one from the
//! article page's metadata. A candidate whose publish time cannot be
//! determined at all is rejected, not passed — stale reposts are worse
//! than the occasional false negative.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use scraper::{Html, Selector};
use tracing::debug;

use crate::fetch::Fetcher;
use crate::models::Candidate;

/// Parse a timestamp string in the formats seen across news sites:
/// RFC 3339, RFC 2822, then naive `%Y-%m-%d %H:%M:%S` and `%Y-%m-%d`
/// assumed UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Recover a publish time from article page metadata.
///
/// Tried in priority order: `article:published_time` meta,
/// `datePublished` itemprop meta, then a `<time datetime=...>` element.
pub fn timestamp_from_html(html: &str) -> Option<DateTime<Utc>> {
    let document = Html::parse_document(html);
    let probes = [
        (r#"meta[property="article:published_time"]"#, "content"),
        (r#"meta[itemprop="datePublished"]"#, "content"),
        ("time[datetime]", "datetime"),
    ];
    for (selector_str, attr) in probes {
        let selector = Selector::parse(selector_str).unwrap();
        if let Some(value) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr(attr))
        {
            if let Some(ts) = parse_timestamp(value) {
                return Some(ts);
            }
        }
    }
    None
}

/// Window comparison. `None` published time is a conservative reject.
pub fn within_window(
    published: Option<DateTime<Utc>>,
    max_age: Duration,
    now: DateTime<Utc>,
) -> bool {
    match published {
        Some(ts) => now - ts <= max_age,
        None => false,
    }
}

/// Full recency check for one candidate, recovering a timestamp from the
/// article page when the feed did not provide one.
pub async fn is_recent(fetcher: &Fetcher, candidate: &Candidate, max_age: Duration) -> bool {
    let published = match candidate.published {
        Some(ts) => Some(ts),
        None => match fetcher.get_text(&candidate.link).await {
            Ok(html) => timestamp_from_html(&html),
            Err(e) => {
                debug!(link = %candidate.link, error = %e, "Timestamp recovery fetch failed");
                None
            }
        },
    };
    within_window(published, max_age, Utc::now())
}
