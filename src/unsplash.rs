//! Image resolution, with an Unsplash stock-photo fallback.
//!
//! The article's own image always wins when it is an absolute HTTP(S) URL.
//! Only when the article has none does the resolver query Unsplash for a
//! single photo matching the title — and even then only while the tracked
//! remaining quota stays above the configured floor. The counter is
//! optimistic: unknown until the first call of a run, then updated from the
//! `X-Ratelimit-Remaining` response header after every call, success or not.
//! Provider errors never propagate; a failed lookup is just "no image".

use tracing::{debug, info, warn};

const SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
const DEFAULT_QUERY: &str = "technology";

/// Stock-photo client owned by the orchestrator; lifetime is one run.
#[derive(Debug)]
pub struct UnsplashClient {
    client: reqwest::Client,
    key: Option<String>,
    min_remaining: u32,
    remaining: Option<u32>,
}

impl UnsplashClient {
    /// A missing or blank key disables the client entirely.
    pub fn new(client: reqwest::Client, key: Option<String>, min_remaining: u32) -> Self {
        let key = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        Self {
            client,
            key,
            min_remaining,
            remaining: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Final image decision for one article.
    ///
    /// Priority: the article's own absolute image URL, then an Unsplash
    /// search for the title (or a generic default term when the title is
    /// empty). `None` means the item publishes as a link post.
    pub async fn resolve_image(&mut self, article_image: Option<&str>, title: &str) -> Option<String> {
        if let Some(img) = article_image.map(str::trim) {
            if img.starts_with("http://") || img.starts_with("https://") {
                return Some(img.to_string());
            }
        }
        if !self.enabled() {
            return None;
        }
        let query = if title.trim().is_empty() {
            DEFAULT_QUERY
        } else {
            title
        };
        self.search_first(query).await
    }

    /// Query Unsplash for exactly one photo. Any failure yields `None`.
    pub async fn search_first(&mut self, query: &str) -> Option<String> {
        let key = self.key.as_ref()?;
        if let Some(remaining) = self.remaining {
            if remaining < self.min_remaining {
                info!(
                    remaining,
                    floor = self.min_remaining,
                    "Unsplash quota low; skipping call"
                );
                return None;
            }
        }

        let resp = match self
            .client
            .get(SEARCH_URL)
            .query(&[("query", query), ("per_page", "1")])
            .header("Authorization", format!("Client-ID {key}"))
            .header("Accept-Version", "v1")
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Unsplash request failed");
                return None;
            }
        };

        // Quota header arrives on error responses too.
        if let Some(remaining) = resp
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
        {
            self.remaining = Some(remaining);
            debug!(remaining, "Unsplash rate limit remaining");
        }

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Unsplash returned an error status");
            return None;
        }

        let data: serde_json::Value = match resp.json().await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Unsplash response was not valid JSON");
                return None;
            }
        };
        data.get("results")?
            .get(0)?
            .get("urls")?
            .get("regular")?
            .as_str()
            .map(String::from)
    }

    #[cfg(test)]
    fn with_remaining(mut self, remaining: u32) -> Self {
        self.remaining = Some(remaining);
        self
    }
}
