//! # Autopost
//!
//! A one-shot news auto-poster: it polls a configured list of RSS feeds and
//! HTML listing pages, filters the discovered articles by keyword and
//! recency, extracts full text and a lead image from each article page,
//! builds a short Vietnamese-labelled caption, and publishes the newest
//! unseen items to a Facebook page.
//!
//! ## Features
//!
//! - Auto-detects RSS/Atom vs HTML per source; listing pages get a layered
//!   scrape (article blocks, then headings, then section-path anchors)
//! - Layered article extraction: readability pass, per-domain selector
//!   tables for the major Vietnamese news sites, then generic fallbacks
//! - Persistent dedup ledger (`posted_links.json`) keyed by link hash, so
//!   repeated runs never re-post
//! - Optional Unsplash fallback image when the article yields none, with a
//!   rate-limit quota guard
//! - Publishes via the Facebook Graph API, as a photo post when an image is
//!   available and a link post otherwise
//!
//! ## Usage
//!
//! ```sh
//! FACEBOOK_PAGE_ID=... FACEBOOK_PAGE_ACCESS_TOKEN=... autopost -n 3
//! ```
//!
//! ## Architecture
//!
//! One sequential pass per invocation:
//! 1. **Discovery**: poll each source in order, feeds before listing pages
//! 2. **Merge**: drop duplicate links (first seen wins), sort newest first
//! 3. **Publish**: walk the list, extracting and posting until the per-run
//!    cap, with per-source caps and the dedup ledger applied per item

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod caption;
mod cli;
mod config;
mod dedup;
mod extract;
mod fetch;
mod filter;
mod graph;
mod models;
mod pipeline;
mod sources;
mod unsplash;
mod utils;

use cli::Cli;
use config::{AppConfig, Sources};
use dedup::DedupStore;
use extract::ContentExtractor;
use fetch::Fetcher;
use graph::PageClient;
use unsplash::UnsplashClient;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("autopost starting up");

    let args = Cli::parse();
    debug!(?args.sources, ?args.posted_file, "Parsed CLI arguments");

    let config = AppConfig::from_cli(&args)?;
    let source_list = Sources::load(&config.sources_file)?;
    info!(
        feeds = source_list.feeds.len(),
        html_sites = source_list.html_sites.len(),
        keywords = source_list.keywords.len(),
        "Loaded source list"
    );

    let fetcher = Fetcher::new(&config.user_agent, config.http_timeout)?;
    let extractor = ContentExtractor::new(fetcher.clone());
    let mut unsplash = UnsplashClient::new(
        fetcher.client().clone(),
        config.unsplash_key.clone(),
        config.unsplash_min_remaining,
    );
    let publisher = PageClient::new(
        fetcher.client().clone(),
        config.page_id.clone(),
        config.page_token.clone(),
    );
    let mut store = DedupStore::load(&config.posted_file);
    info!(known_links = store.len(), "Loaded posted ledger");

    let report = pipeline::run_once(
        &config,
        &source_list,
        &fetcher,
        &extractor,
        &mut unsplash,
        &publisher,
        &mut store,
    )
    .await;

    info!(
        discovered = report.discovered,
        published = report.published,
        elapsed = ?start_time.elapsed(),
        "Run complete"
    );
    Ok(())
}
