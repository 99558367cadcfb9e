//! Shared HTTP fetcher.
//!
//! One `reqwest::Client` is built at startup with the configured identity
//! header and timeout, then cloned into every component that talks to the
//! network. A non-2xx response is an error carrying the status and a body
//! preview, so callers never have to inspect a response twice.

use std::time::Duration;
use thiserror::Error;

use crate::utils::truncate_for_log;

/// Error raised by [`Fetcher`] requests.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

/// Thin wrapper around a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Build the shared client with a fixed User-Agent and request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// The underlying client, for components that build their own requests
    /// (Graph publisher, Unsplash) but should share the pool and identity.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET a URL and return the body as text. Non-2xx is an error.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let bytes = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// GET a URL and return the raw body. Non-2xx is an error.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}
