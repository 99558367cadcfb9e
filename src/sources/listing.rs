//! HTML listing extraction for sources without a usable feed.
//!
//! Three strategies, tried in order until one yields items:
//!
//! 1. Repeating `<article>` blocks — first anchor is the link, first heading
//!    is the title, first paragraph is the summary.
//! 2. Headings that directly wrap a link (`h2 a[href]`, `h3 a[href]`).
//! 3. Any anchor whose href contains the source's section path marker, for
//!    topical category pages without article wrappers.
//!
//! Relative hrefs are resolved against the configured base URL. HTML-sourced
//! items carry no publish timestamp; the recency filter recovers one from
//! the article page when a freshness window is configured.

use scraper::{Html, Selector};
use url::Url;

use crate::models::Candidate;
use crate::utils::clean_text;

/// At most this many items are taken from one listing page per run.
const MAX_LISTING_ITEMS: usize = 20;

/// Extract candidate items from a listing page.
pub fn extract_listing(
    html: &str,
    base_url: &str,
    section: Option<&str>,
    source_url: &str,
) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let article_selector = Selector::parse("article").unwrap();
    let anchor_selector = Selector::parse("a[href]").unwrap();
    let heading_selector = Selector::parse("h1, h2, h3").unwrap();
    let paragraph_selector = Selector::parse("p").unwrap();

    let mut items = Vec::new();
    for article in document.select(&article_selector) {
        let Some(anchor) = article.select(&anchor_selector).next() else {
            continue;
        };
        let title_text = article
            .select(&heading_selector)
            .next()
            .map(|h| h.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_else(|| anchor.text().collect::<Vec<_>>().join(" "));
        let title = clean_text(&title_text);
        let Some(link) = resolve_href(anchor.value().attr("href").unwrap_or(""), base.as_ref())
        else {
            continue;
        };
        let summary = article
            .select(&paragraph_selector)
            .next()
            .map(|p| clean_text(&p.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();
        if !title.is_empty() {
            items.push(candidate(title, link, summary, source_url));
        }
    }

    if items.is_empty() {
        let heading_link_selector = Selector::parse("h2 a[href], h3 a[href]").unwrap();
        for anchor in document.select(&heading_link_selector) {
            let title = clean_text(&anchor.text().collect::<Vec<_>>().join(" "));
            let Some(link) = resolve_href(anchor.value().attr("href").unwrap_or(""), base.as_ref())
            else {
                continue;
            };
            if !title.is_empty() {
                items.push(candidate(title, link, String::new(), source_url));
            }
        }
    }

    if items.is_empty() {
        if let Some(marker) = section.map(str::trim).filter(|m| !m.is_empty()) {
            for anchor in document.select(&anchor_selector) {
                let href = anchor.value().attr("href").unwrap_or("");
                if !href.contains(marker) {
                    continue;
                }
                let text = clean_text(&anchor.text().collect::<Vec<_>>().join(" "));
                let title = if !text.is_empty() {
                    text
                } else {
                    clean_text(anchor.value().attr("title").unwrap_or(""))
                };
                let Some(link) = resolve_href(href, base.as_ref()) else {
                    continue;
                };
                if !title.is_empty() {
                    items.push(candidate(title, link, String::new(), source_url));
                }
            }
        }
    }

    items.truncate(MAX_LISTING_ITEMS);
    items
}

fn candidate(title: String, link: String, summary: String, source_url: &str) -> Candidate {
    Candidate {
        title,
        link,
        summary,
        published: None,
        source_id: source_url.to_string(),
    }
}

fn resolve_href(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    base.and_then(|b| b.join(href).ok()).map(|u| u.to_string())
}
