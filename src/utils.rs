//! Small helpers shared across the pipeline: text normalization, markup
//! stripping, host extraction, and log-friendly truncation.

use scraper::Html;
use url::Url;

/// Collapse all runs of whitespace into single spaces and trim the ends.
///
/// Scraped text and feed excerpts arrive full of newlines and indentation;
/// every piece of text that leaves this crate goes through here first.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup from an HTML fragment and normalize the remaining text.
///
/// Feed summaries are frequently HTML (`<p>`, `<a>`, entity escapes); this
/// parses the fragment and keeps only the text nodes.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    clean_text(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Extract the hostname from a URL, lowercased and without a leading `www.`.
///
/// Returns an empty string when the URL does not parse or has no host.
pub fn host_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|h| h.to_lowercase().trim_start_matches("www.").to_string())
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte count
/// indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}
