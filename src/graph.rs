//! Facebook Graph API page publisher.
//!
//! Two operations: a link post to the page feed and a photo post. Both are
//! form-encoded POSTs; a non-2xx response becomes a [`GraphError::Api`]
//! carrying the status and response body so the orchestrator can log exactly
//! what the platform rejected. The [`Publisher`] trait is the seam the run
//! orchestrator is generic over, which keeps the publish path testable
//! without credentials.

use thiserror::Error;
use tracing::{debug, instrument};

const GRAPH_BASE: &str = "https://graph.facebook.com/v19.0";

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("graph API error {status}: {body}")]
    Api { status: u16, body: String },
}

/// Publishing seam. Implemented by [`PageClient`] in production and by
/// in-memory fakes in the orchestrator tests.
pub trait Publisher {
    /// Post a message with an attached link. Returns the new post id.
    async fn publish_link(&self, message: &str, link: &str) -> Result<String, GraphError>;
    /// Post a photo by URL with a caption. Returns the new post id.
    async fn publish_photo(&self, caption: &str, image_url: &str) -> Result<String, GraphError>;
}

/// Graph API client bound to one page.
#[derive(Debug, Clone)]
pub struct PageClient {
    client: reqwest::Client,
    page_id: String,
    token: String,
}

impl PageClient {
    pub fn new(client: reqwest::Client, page_id: String, token: String) -> Self {
        Self {
            client,
            page_id,
            token,
        }
    }

    #[instrument(level = "debug", skip_all, fields(endpoint))]
    async fn post_form(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<String, GraphError> {
        let url = format!("{GRAPH_BASE}/{}/{endpoint}", self.page_id);
        let resp = self.client.post(&url).form(form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GraphError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let post_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(String::from))
            .unwrap_or_default();
        debug!(%post_id, endpoint, "Graph call succeeded");
        Ok(post_id)
    }
}

impl Publisher for PageClient {
    async fn publish_link(&self, message: &str, link: &str) -> Result<String, GraphError> {
        self.post_form(
            "feed",
            &[
                ("message", message),
                ("link", link),
                ("access_token", self.token.as_str()),
            ],
        )
        .await
    }

    async fn publish_photo(&self, caption: &str, image_url: &str) -> Result<String, GraphError> {
        self.post_form(
            "photos",
            &[
                ("caption", caption),
                ("url", image_url),
                ("published", "true"),
                ("access_token", self.token.as_str()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_carries_status_and_body() {
        let err = GraphError::Api {
            status: 400,
            body: r#"{"error":{"message":"Invalid OAuth access token"}}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("Invalid OAuth access token"));
    }

    #[test]
    fn test_page_client_construction() {
        let client = PageClient::new(
            reqwest::Client::new(),
            "1234".to_string(),
            "token".to_string(),
        );
        assert_eq!(client.page_id, "1234");
    }
}
