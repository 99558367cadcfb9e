//! The run orchestrator.
//!
//! One pass, then exit: gather candidates from every configured source,
//! merge and sort them, then walk the list in order publishing until the
//! per-run cap is hit. Every per-item failure is recovered locally — a
//! source that will not parse, an article that will not extract, a publish
//! the platform rejects — and the walk continues. Only a confirmed publish
//! marks a link as seen, so anything that failed stays eligible for the
//! next run.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::{Rng, rng};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::caption;
use crate::config::{AppConfig, Sources};
use crate::dedup::DedupStore;
use crate::extract::ExtractArticle;
use crate::fetch::Fetcher;
use crate::filter;
use crate::graph::Publisher;
use crate::models::Candidate;
use crate::sources::{self, merge_candidates};
use crate::unsplash::UnsplashClient;
use crate::utils::truncate_for_log;

/// Title used when neither extraction nor the feed produced one.
const FALLBACK_TITLE: &str = "Bài viết";

/// What one pass accomplished.
#[derive(Debug)]
pub struct RunReport {
    pub discovered: usize,
    pub published: usize,
}

/// Execute one full pass: discover, merge, sort, publish.
#[instrument(level = "info", skip_all)]
pub async fn run_once<E, P>(
    config: &AppConfig,
    source_list: &Sources,
    fetcher: &Fetcher,
    extractor: &E,
    unsplash: &mut UnsplashClient,
    publisher: &P,
    store: &mut DedupStore,
) -> RunReport
where
    E: ExtractArticle,
    P: Publisher,
{
    let mut gathered: Vec<Candidate> = Vec::new();
    for descriptor in source_list.descriptors() {
        match sources::discover(fetcher, &descriptor, &source_list.keywords).await {
            Ok(items) => {
                info!(source = %descriptor.url, count = items.len(), "Discovered candidates");
                gathered.extend(items);
            }
            Err(e) => {
                warn!(source = %descriptor.url, error = %e, "Source failed; yielding no items");
            }
        }
        sleep(config.request_delay).await;
    }

    let mut items = merge_candidates(gathered);
    sort_newest_first(&mut items);
    let discovered = items.len();
    info!(count = discovered, "Candidates after merge");

    let published = publish_batch(config, items, fetcher, extractor, unsplash, publisher, store).await;
    RunReport {
        discovered,
        published,
    }
}

/// Newest first; items without a timestamp sort as oldest. The sort is
/// stable, so undated items keep their discovery order at the tail.
pub fn sort_newest_first(items: &mut [Candidate]) {
    items.sort_by_key(|item| Reverse(item.published.unwrap_or(DateTime::<Utc>::MIN_UTC)));
}

/// Walk merged candidates in order, publishing until the per-run cap.
///
/// Per item: skip if seen, skip if its source hit the per-source cap, skip
/// if outside the freshness window; otherwise extract, build the caption,
/// resolve an image, publish, and — only on confirmed success — record the
/// link and apply the inter-post delay.
pub async fn publish_batch<E, P>(
    config: &AppConfig,
    items: Vec<Candidate>,
    fetcher: &Fetcher,
    extractor: &E,
    unsplash: &mut UnsplashClient,
    publisher: &P,
    store: &mut DedupStore,
) -> usize
where
    E: ExtractArticle,
    P: Publisher,
{
    let mut per_source: HashMap<String, usize> = HashMap::new();
    let mut published = 0usize;

    for item in items {
        if published >= config.max_posts_per_run {
            break;
        }
        if store.seen(&item.link) {
            debug!(link = %item.link, "Already posted; skipping");
            continue;
        }
        if per_source.get(&item.source_id).copied().unwrap_or(0) >= config.max_posts_per_source {
            debug!(link = %item.link, source = %item.source_id, "Per-source cap reached; skipping");
            continue;
        }
        if let Some(hours) = config.max_age_hours {
            if !filter::is_recent(fetcher, &item, ChronoDuration::hours(hours)).await {
                debug!(link = %item.link, max_age_hours = hours, "Outside freshness window; skipping");
                continue;
            }
        }

        let extraction = extractor.extract(&item.link).await;

        let title = if !extraction.title.trim().is_empty() {
            extraction.title.clone()
        } else if !item.title.trim().is_empty() {
            item.title.clone()
        } else {
            FALLBACK_TITLE.to_string()
        };
        let fulltext = if extraction.text.is_empty() {
            item.summary.clone()
        } else {
            extraction.text.clone()
        };
        let summary_source = if config.use_fulltext_for_summary || item.summary.is_empty() {
            &fulltext
        } else {
            &item.summary
        };
        let summary = caption::summarize(summary_source, config.summary_max_len);
        let caption = caption::build_caption(&title, &summary, &item.link);

        let image = unsplash.resolve_image(extraction.image.as_deref(), &title).await;

        let result = match &image {
            Some(image_url) => publisher.publish_photo(&caption, image_url).await,
            None => publisher.publish_link(&caption, &item.link).await,
        };

        match result {
            Ok(post_id) => {
                info!(
                    link = %item.link,
                    post_id = %post_id,
                    title = %truncate_for_log(&title, 120),
                    with_image = image.is_some(),
                    "Published"
                );
                if let Err(e) = store.record(&item.link, &title, item.published).await {
                    // The post is live; losing the ledger entry risks a
                    // duplicate next run, which we accept and make loud.
                    error!(link = %item.link, error = %e, "Failed to persist posted ledger");
                }
                *per_source.entry(item.source_id.clone()).or_insert(0) += 1;
                published += 1;

                let mut delay = config.post_delay;
                if config.post_jitter_ms > 0 {
                    delay += Duration::from_millis(rng().random_range(0..=config.post_jitter_ms));
                }
                sleep(delay).await;
            }
            Err(e) => {
                error!(
                    link = %item.link,
                    title = %truncate_for_log(&title, 120),
                    error = %e,
                    "Publish failed; item stays eligible for the next run"
                );
            }
        }
    }

    published
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphError;
    use crate::models::Extraction;
    use std::sync::Mutex;

    struct FixedExtractor(Extraction);

    impl ExtractArticle for FixedExtractor {
        async fn extract(&self, _url: &str) -> Extraction {
            self.0.clone()
        }
    }

    struct MockPublisher {
        posts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockPublisher {
        fn new() -> Self {
            Self {
                posts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                posts: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn posted(&self) -> Vec<String> {
            self.posts.lock().unwrap().clone()
        }
    }

    impl Publisher for MockPublisher {
        async fn publish_link(&self, _message: &str, link: &str) -> Result<String, GraphError> {
            if self.fail {
                return Err(GraphError::Api {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            self.posts.lock().unwrap().push(link.to_string());
            Ok("page_post".to_string())
        }

        async fn publish_photo(&self, _caption: &str, image_url: &str) -> Result<String, GraphError> {
            if self.fail {
                return Err(GraphError::Api {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            self.posts.lock().unwrap().push(image_url.to_string());
            Ok("page_photo".to_string())
        }
    }

    fn test_config(max_run: usize, max_source: usize) -> AppConfig {
        AppConfig {
            page_id: "1234".to_string(),
            page_token: "token".to_string(),
            unsplash_key: None,
            unsplash_min_remaining: 5,
            max_posts_per_run: max_run,
            max_posts_per_source: max_source,
            max_age_hours: None,
            use_fulltext_for_summary: true,
            summary_max_len: 700,
            request_delay: Duration::from_millis(0),
            post_delay: Duration::from_millis(0),
            post_jitter_ms: 0,
            http_timeout: Duration::from_secs(5),
            user_agent: "test".to_string(),
            sources_file: "sources.yml".to_string(),
            posted_file: "posted_links.json".to_string(),
        }
    }

    fn fetcher() -> Fetcher {
        Fetcher::new("test", Duration::from_secs(5)).unwrap()
    }

    fn unsplash_disabled() -> UnsplashClient {
        UnsplashClient::new(reqwest::Client::new(), None, 5)
    }

    fn temp_ledger(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("autopost-pipeline-{}-{}.json", name, std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    fn candidate(link: &str, source: &str, age_hours: i64) -> Candidate {
        Candidate {
            title: format!("Title for {link}"),
            link: link.to_string(),
            summary: "A short excerpt.".to_string(),
            published: Some(Utc::now() - ChronoDuration::hours(age_hours)),
            source_id: source.to_string(),
        }
    }

    #[test]
    fn test_sort_newest_first_undated_last() {
        let mut items = vec![
            Candidate {
                published: None,
                ..candidate("https://e.com/undated", "s", 0)
            },
            candidate("https://e.com/old", "s", 48),
            candidate("https://e.com/new", "s", 1),
        ];
        sort_newest_first(&mut items);
        assert_eq!(items[0].link, "https://e.com/new");
        assert_eq!(items[1].link, "https://e.com/old");
        assert_eq!(items[2].link, "https://e.com/undated");
    }

    #[tokio::test]
    async fn test_per_source_cap_limits_batch() {
        let path = temp_ledger("per-source-cap");
        let _ = std::fs::remove_file(&path);
        let mut store = DedupStore::load(&path);

        let config = test_config(5, 2);
        let mut items = vec![
            candidate("https://e.com/a", "s1", 1),
            candidate("https://e.com/b", "s1", 2),
            candidate("https://e.com/c", "s1", 3),
        ];
        sort_newest_first(&mut items);

        let publisher = MockPublisher::new();
        let extractor = FixedExtractor(Extraction::default());
        let mut unsplash = unsplash_disabled();
        let published = publish_batch(
            &config,
            items,
            &fetcher(),
            &extractor,
            &mut unsplash,
            &publisher,
            &mut store,
        )
        .await;

        assert_eq!(published, 2);
        assert_eq!(
            publisher.posted(),
            vec!["https://e.com/a".to_string(), "https://e.com/b".to_string()]
        );
        assert!(store.seen("https://e.com/a"));
        assert!(store.seen("https://e.com/b"));
        assert!(!store.seen("https://e.com/c"));
        assert_eq!(store.len(), 2);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_per_run_cap() {
        let path = temp_ledger("per-run-cap");
        let _ = std::fs::remove_file(&path);
        let mut store = DedupStore::load(&path);

        let config = test_config(1, 5);
        let items = vec![
            candidate("https://e.com/a", "s1", 1),
            candidate("https://e.com/b", "s2", 2),
        ];

        let publisher = MockPublisher::new();
        let extractor = FixedExtractor(Extraction::default());
        let mut unsplash = unsplash_disabled();
        let published = publish_batch(
            &config,
            items,
            &fetcher(),
            &extractor,
            &mut unsplash,
            &publisher,
            &mut store,
        )
        .await;

        assert_eq!(published, 1);
        assert_eq!(publisher.posted().len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let path = temp_ledger("idempotent");
        let _ = std::fs::remove_file(&path);
        let mut store = DedupStore::load(&path);

        let config = test_config(5, 5);
        let items = vec![
            candidate("https://e.com/a", "s1", 1),
            candidate("https://e.com/b", "s1", 2),
        ];
        let extractor = FixedExtractor(Extraction::default());

        let first = MockPublisher::new();
        let mut unsplash = unsplash_disabled();
        let published_first = publish_batch(
            &config,
            items.clone(),
            &fetcher(),
            &extractor,
            &mut unsplash,
            &first,
            &mut store,
        )
        .await;
        assert_eq!(published_first, 2);

        let second = MockPublisher::new();
        let published_second = publish_batch(
            &config,
            items,
            &fetcher(),
            &extractor,
            &mut unsplash,
            &second,
            &mut store,
        )
        .await;
        assert_eq!(published_second, 0);
        assert!(second.posted().is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_failed_publish_not_recorded() {
        let path = temp_ledger("failed-publish");
        let _ = std::fs::remove_file(&path);
        let mut store = DedupStore::load(&path);

        let config = test_config(5, 5);
        let items = vec![candidate("https://e.com/a", "s1", 1)];
        let publisher = MockPublisher::failing();
        let extractor = FixedExtractor(Extraction::default());
        let mut unsplash = unsplash_disabled();
        let published = publish_batch(
            &config,
            items,
            &fetcher(),
            &extractor,
            &mut unsplash,
            &publisher,
            &mut store,
        )
        .await;

        assert_eq!(published, 0);
        assert!(!store.seen("https://e.com/a"));
        assert!(store.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_photo_post_when_article_has_image() {
        let path = temp_ledger("photo-post");
        let _ = std::fs::remove_file(&path);
        let mut store = DedupStore::load(&path);

        let config = test_config(5, 5);
        let items = vec![candidate("https://e.com/a", "s1", 1)];
        let publisher = MockPublisher::new();
        let extractor = FixedExtractor(Extraction {
            title: "Extracted title".to_string(),
            text: "Extracted body text.".to_string(),
            image: Some("https://cdn.e.com/photo.jpg".to_string()),
        });
        let mut unsplash = unsplash_disabled();
        let published = publish_batch(
            &config,
            items,
            &fetcher(),
            &extractor,
            &mut unsplash,
            &publisher,
            &mut store,
        )
        .await;

        assert_eq!(published, 1);
        assert_eq!(publisher.posted(), vec!["https://cdn.e.com/photo.jpg".to_string()]);

        let _ = std::fs::remove_file(&path);
    }
}
