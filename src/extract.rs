//! Full-text and image extraction from article pages.
//!
//! Target sites vary widely in markup quality, so extraction is layered and
//! short-circuits on the first strategy that produces enough text:
//!
//! 1. Readability-style boilerplate removal over the fetched HTML; accepted
//!    when it recovers at least 200 characters.
//! 2. An ordered per-domain CSS selector table covering the known content
//!    containers of supported sites; first selector whose paragraphs exceed
//!    120 characters wins.
//! 3. The first generic `<article>` container with more than 100 characters
//!    of paragraph text.
//! 4. Every `<p>` on the page, concatenated.
//!
//! The representative image is looked up independently of the text path:
//! `og:image`, then `twitter:image`, then the first `<img>` (lazy-loading
//! sites keep the real URL in `data-src`, so that attribute is checked
//! before `src`). A total fetch failure yields an empty [`Extraction`];
//! the orchestrator falls back to the feed-provided summary.

use once_cell::sync::Lazy;
use readability::extractor;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::fetch::Fetcher;
use crate::models::Extraction;
use crate::utils::{clean_text, host_of};

/// Minimum character count for the readability result to be trusted.
const READABILITY_MIN_CHARS: usize = 200;
/// Minimum character count for a domain-selector match.
const DOMAIN_SELECTOR_MIN_CHARS: usize = 120;
/// Minimum character count for the generic `<article>` fallback.
const ARTICLE_MIN_CHARS: usize = 100;

/// Known content containers per domain, tried in order. Sites not listed
/// here get the generic strategy.
static DOMAIN_SELECTORS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        ("vnexpress.net", vec!["article.fck_detail", "div.sidebar_1"]),
        (
            "tuoitre.vn",
            vec!["div.detail-content.afcbc-body", "div#main-detail", "article"],
        ),
        (
            "thanhnien.vn",
            vec!["div.detail__content", "div#abody", "article"],
        ),
        (
            "dantri.com.vn",
            vec!["div.singular-content", "div.article__body", "article"],
        ),
        ("zingnews.vn", vec!["div.the-article-body", "article"]),
        ("vietnamnet.vn", vec!["div#ArticleContent", "article"]),
        (
            "genk.vn",
            vec!["div.knc-content", "div#contentDetail", "article"],
        ),
    ])
});

/// Article extraction seam, so the orchestrator can be exercised in tests
/// without touching the network.
pub trait ExtractArticle {
    async fn extract(&self, url: &str) -> Extraction;
}

/// The production extractor: one fetch, then the layered strategies.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    fetcher: Fetcher,
}

impl ContentExtractor {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

impl ExtractArticle for ContentExtractor {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Extraction {
        let html = match self.fetcher.get_text(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%url, error = %e, "Article fetch failed; extraction empty");
                return Extraction::default();
            }
        };
        extract_from_html(url, &html)
    }
}

/// Run the layered extraction over already-fetched HTML.
pub fn extract_from_html(url: &str, html: &str) -> Extraction {
    let image = find_page_image(html);

    if let Ok(parsed) = Url::parse(url) {
        match extractor::extract(&mut Cursor::new(html.as_bytes()), &parsed) {
            Ok(product) => {
                let text = clean_text(&product.text);
                if text.chars().count() >= READABILITY_MIN_CHARS {
                    return Extraction {
                        title: clean_text(&product.title),
                        text,
                        image,
                    };
                }
                debug!(%url, chars = text.chars().count(), "Readability output too short");
            }
            Err(e) => debug!(%url, error = %e, "Readability failed; using selector fallback"),
        }
    }

    let (title, text) = extract_with_selectors(url, html);
    Extraction { title, text, image }
}

/// Selector-based fallback: domain table, then generic `<article>`, then
/// every paragraph on the page.
fn extract_with_selectors(url: &str, html: &str) -> (String, String) {
    let document = Html::parse_document(html);
    let paragraph_selector = Selector::parse("p").unwrap();

    let h1_selector = Selector::parse("h1").unwrap();
    let title = document
        .select(&h1_selector)
        .next()
        .map(|h| clean_text(&h.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default();

    let domain = host_of(url);
    if let Some(selectors) = DOMAIN_SELECTORS.get(domain.as_str()) {
        for selector_str in selectors {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            if let Some(node) = document.select(&selector).next() {
                let text = paragraph_text(node, &paragraph_selector);
                if text.chars().count() > DOMAIN_SELECTOR_MIN_CHARS {
                    return (title, text);
                }
            }
        }
    }

    let article_selector = Selector::parse("article").unwrap();
    if let Some(node) = document.select(&article_selector).next() {
        let text = paragraph_text(node, &paragraph_selector);
        if text.chars().count() > ARTICLE_MIN_CHARS {
            return (title, text);
        }
    }

    let text = document
        .select(&paragraph_selector)
        .map(|p| clean_text(&p.text().collect::<Vec<_>>().join(" ")))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (title, text)
}

fn paragraph_text(node: ElementRef<'_>, paragraph_selector: &Selector) -> String {
    node.select(paragraph_selector)
        .map(|p| clean_text(&p.text().collect::<Vec<_>>().join(" ")))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Locate a representative image in the page markup.
///
/// Priority: `og:image` meta content, `twitter:image` meta content, first
/// `<img>` source attribute. Returned verbatim; the image resolver decides
/// whether the value is usable.
pub fn find_page_image(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let og_selector = Selector::parse(r#"meta[property="og:image"]"#).unwrap();
    if let Some(content) = first_attr(&document, &og_selector, "content") {
        return Some(content);
    }

    let twitter_selector = Selector::parse(r#"meta[name="twitter:image"]"#).unwrap();
    if let Some(content) = first_attr(&document, &twitter_selector, "content") {
        return Some(content);
    }

    let img_selector = Selector::parse("img").unwrap();
    if let Some(img) = document.select(&img_selector).next() {
        let src = img
            .value()
            .attr("data-src")
            .or_else(|| img.value().attr("src"))
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(src) = src {
            return Some(src.to_string());
        }
    }
    None
}

fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
