//! Runtime configuration.
//!
//! Two pieces: [`AppConfig`], an immutable snapshot of every tuning knob and
//! credential, built once from the CLI and passed by reference to every
//! component; and [`Sources`], the YAML source list (`sources.yml`) naming
//! the feeds and HTML listing pages to poll plus an optional keyword filter.
//!
//! # Source file format
//!
//! ```yaml
//! feeds:
//!   - https://vnexpress.net/rss/so-hoa.rss
//! html_sites:
//!   - url: https://vnexpress.net/khoa-hoc-cong-nghe/ai
//!     base: https://vnexpress.net
//!     section: /khoa-hoc-cong-nghe/
//! keywords:
//!   - ai
//!   - chatgpt
//! ```
//!
//! Entries under `feeds` are still auto-detected: a URL that turns out to
//! serve HTML rather than a syndication feed falls back to listing
//! extraction, so misfiled sources degrade instead of breaking.

use serde::Deserialize;
use std::error::Error;
use std::time::Duration;

use crate::cli::Cli;

/// Immutable run configuration. Constructed once at startup; no component
/// reads ambient environment state after this point.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub page_id: String,
    pub page_token: String,
    pub unsplash_key: Option<String>,
    pub unsplash_min_remaining: u32,
    pub max_posts_per_run: usize,
    pub max_posts_per_source: usize,
    /// Freshness window in hours; `None` disables the recency filter.
    pub max_age_hours: Option<i64>,
    pub use_fulltext_for_summary: bool,
    pub summary_max_len: usize,
    pub request_delay: Duration,
    pub post_delay: Duration,
    pub post_jitter_ms: u64,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub sources_file: String,
    pub posted_file: String,
}

impl AppConfig {
    /// Validate credentials and freeze the CLI arguments into a config.
    ///
    /// Missing page credentials are a fatal configuration error, caught here
    /// before any network activity.
    pub fn from_cli(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let page_id = cli
            .page_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or("FACEBOOK_PAGE_ID is not set")?
            .to_string();
        let page_token = cli
            .page_token
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or("FACEBOOK_PAGE_ACCESS_TOKEN is not set")?
            .to_string();

        Ok(Self {
            page_id,
            page_token,
            unsplash_key: cli
                .unsplash_key
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            unsplash_min_remaining: cli.unsplash_min_remaining,
            max_posts_per_run: cli.max_posts,
            max_posts_per_source: cli.max_per_source,
            max_age_hours: cli.max_age_hours,
            use_fulltext_for_summary: !cli.summary_from_feed,
            summary_max_len: cli.summary_max_len,
            request_delay: Duration::from_millis(cli.request_delay_ms),
            post_delay: Duration::from_millis(cli.post_delay_ms),
            post_jitter_ms: cli.post_jitter_ms,
            http_timeout: Duration::from_secs(cli.timeout_secs),
            user_agent: cli.user_agent.clone(),
            sources_file: cli.sources.clone(),
            posted_file: cli.posted_file.clone(),
        })
    }
}

/// An HTML listing page to poll, with an optional base URL for resolving
/// relative hrefs and an optional section path marker used as a last-resort
/// anchor filter (topical category pages without `<article>` wrappers).
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlSource {
    pub url: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

/// One source to poll, RSS or HTML; the adapter auto-detects which.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub url: String,
    pub base: Option<String>,
    pub section: Option<String>,
}

/// The parsed `sources.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Sources {
    #[serde(default)]
    pub feeds: Vec<String>,
    #[serde(default)]
    pub html_sites: Vec<HtmlSource>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Sources {
    /// Load and parse the source file. A missing or malformed file is fatal.
    ///
    /// Keywords are lowercased here so the adapters can do case-insensitive
    /// substring matches without re-normalizing per item.
    pub fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read source file {path}: {e}"))?;
        let mut sources: Sources = serde_yaml::from_str(&text)?;
        sources.keywords = sources
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Ok(sources)
    }

    /// All sources as uniform descriptors, feeds first. Ordering matters:
    /// feed-sourced duplicates carry timestamps and win first-seen merges.
    pub fn descriptors(&self) -> Vec<SourceDescriptor> {
        self.feeds
            .iter()
            .map(|url| SourceDescriptor {
                url: url.clone(),
                base: None,
                section: None,
            })
            .chain(self.html_sites.iter().map(|site| SourceDescriptor {
                url: site.url.clone(),
                base: site.base.clone(),
                section: site.section.clone(),
            }))
            .collect()
    }
}
