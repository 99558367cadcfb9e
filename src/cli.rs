//! Command-line interface definitions.
//!
//! All options can be provided via command-line flags or environment
//! variables, so the binary works equally well interactively and from a
//! cron job or CI secret store.

use clap::Parser;

/// One publishing pass: discover articles, extract, dedupe, post, exit.
///
/// # Examples
///
/// ```sh
/// # Post up to 3 new articles using sources.yml in the working directory
/// autopost --page-id 1234 --page-token TOKEN
///
/// # Cap the run at one post and only consider articles under a day old
/// autopost -n 1 --max-age-hours 24
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Maximum number of posts to publish in this run
    #[arg(short = 'n', long = "max", env = "MAX_POSTS_PER_RUN", default_value_t = 3)]
    pub max_posts: usize,

    /// Maximum posts originating from a single source in this run
    #[arg(long, env = "MAX_POSTS_PER_SOURCE", default_value_t = 2)]
    pub max_per_source: usize,

    /// Path to the YAML source list (feeds, html_sites, keywords)
    #[arg(short, long, env = "SOURCES_FILE", default_value = "sources.yml")]
    pub sources: String,

    /// Path to the published-links ledger
    #[arg(long, env = "POSTED_FILE", default_value = "posted_links.json")]
    pub posted_file: String,

    /// Facebook Page ID to publish to
    #[arg(long, env = "FACEBOOK_PAGE_ID")]
    pub page_id: Option<String>,

    /// Facebook Page access token
    #[arg(long, env = "FACEBOOK_PAGE_ACCESS_TOKEN", hide_env_values = true)]
    pub page_token: Option<String>,

    /// Unsplash access key; enables the stock-photo image fallback
    #[arg(long, env = "UNSPLASH_ACCESS_KEY", hide_env_values = true)]
    pub unsplash_key: Option<String>,

    /// Skip the Unsplash call when the tracked remaining quota is below this floor
    #[arg(long, env = "UNSPLASH_MIN_REMAINING", default_value_t = 5)]
    pub unsplash_min_remaining: u32,

    /// Only publish articles younger than this many hours; unset disables the check
    #[arg(long, env = "MAX_AGE_HOURS")]
    pub max_age_hours: Option<i64>,

    /// Build the caption summary from the feed excerpt instead of extracted full text
    #[arg(long, env = "SUMMARY_FROM_FEED")]
    pub summary_from_feed: bool,

    /// Caption summary length cap, in characters
    #[arg(long, env = "SUMMARY_MAX_LEN", default_value_t = 700)]
    pub summary_max_len: usize,

    /// Politeness delay between source fetches, in milliseconds
    #[arg(long, env = "REQUEST_DELAY_MS", default_value_t = 800)]
    pub request_delay_ms: u64,

    /// Fixed delay after each successful post, in milliseconds
    #[arg(long, env = "POST_DELAY_MS", default_value_t = 1500)]
    pub post_delay_ms: u64,

    /// Extra uniform-random delay added after each post, in milliseconds
    #[arg(long, env = "POST_JITTER_MS", default_value_t = 0)]
    pub post_jitter_ms: u64,

    /// HTTP request timeout, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(
        long,
        env = "CRAWLER_USER_AGENT",
        default_value = "Mozilla/5.0 (compatible; AutoPagePoster/2.1)"
    )]
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["autopost"]);
        assert_eq!(cli.max_posts, 3);
        assert_eq!(cli.max_per_source, 2);
        assert_eq!(cli.sources, "sources.yml");
        assert_eq!(cli.posted_file, "posted_links.json");
        assert_eq!(cli.summary_max_len, 700);
        assert!(cli.max_age_hours.is_none());
        assert!(!cli.summary_from_feed);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "autopost",
            "-n",
            "5",
            "--sources",
            "/etc/autopost/sources.yml",
            "--max-age-hours",
            "24",
            "--summary-from-feed",
        ]);
        assert_eq!(cli.max_posts, 5);
        assert_eq!(cli.sources, "/etc/autopost/sources.yml");
        assert_eq!(cli.max_age_hours, Some(24));
        assert!(cli.summary_from_feed);
    }
}
