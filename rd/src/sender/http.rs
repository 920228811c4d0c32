//! HTTP webhook sender
//!
//! POSTs each message as JSON to `{base_url}/{target_id}` with the credential
//! as a bearer token.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{MessageSender, SendError};
use crate::config::SenderConfig;

/// Sender backed by a shared `reqwest` client
pub struct HttpSender {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpSender {
    /// Create a new sender from configuration
    ///
    /// `timeout` is the dispatch send deadline, so the client gives up at the
    /// same moment the loop would.
    pub fn from_config(config: &SenderConfig, timeout: Duration) -> Result<Self, SendError> {
        debug!(?config, ?timeout, "from_config: called");
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SendError::InvalidConfig(format!(
                "base-url must be an http(s) URL, got '{}'",
                config.base_url
            )));
        }

        let http = Client::builder().timeout(timeout).build().map_err(SendError::Network)?;

        Ok(Self {
            base_url,
            http,
            timeout,
        })
    }

    /// Destination URL for a target
    fn url_for(&self, target_id: &str) -> String {
        format!("{}/{}", self.base_url, target_id)
    }

    fn build_body(target_id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "recipient": target_id,
            "text": text,
        })
    }
}

#[async_trait]
impl MessageSender for HttpSender {
    async fn send_text(&self, credential: &str, target_id: &str, text: &str) -> Result<(), SendError> {
        let url = self.url_for(target_id);
        debug!(%url, text_len = text.len(), "send_text: called");

        let response = self
            .http
            .post(url)
            .bearer_auth(credential)
            .json(&Self::build_body(target_id, text))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SendError::Timeout(self.timeout)
                } else {
                    SendError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "send_text: remote rejected message");
            let message = response.text().await.unwrap_or_default();
            return Err(SendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!("send_text: success");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn config(base_url: &str) -> SenderConfig {
        SenderConfig {
            base_url: base_url.to_string(),
            ..SenderConfig::default()
        }
    }

    #[test]
    fn test_url_for_strips_trailing_slash() {
        let sender = HttpSender::from_config(&config("https://relay.example.com/messages/"), TIMEOUT).unwrap();
        assert_eq!(sender.url_for("room-7"), "https://relay.example.com/messages/room-7");
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = HttpSender::from_config(&config("ftp://relay.example.com"), TIMEOUT);
        assert!(matches!(result, Err(SendError::InvalidConfig(_))));
    }

    #[test]
    fn test_timeout_follows_send_deadline() {
        let sender = HttpSender::from_config(&config("http://localhost:9"), Duration::from_millis(1234)).unwrap();
        assert_eq!(sender.timeout, Duration::from_millis(1234));
    }

    #[test]
    fn test_body_shape() {
        let body = HttpSender::build_body("room-7", "hello");
        assert_eq!(body["recipient"], "room-7");
        assert_eq!(body["text"], "hello");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        // Port 9 (discard) on localhost is closed on any sane test host
        let sender = HttpSender::from_config(&config("http://127.0.0.1:9"), Duration::from_secs(2)).unwrap();
        let result = sender.send_text("tok", "room-7", "hello").await;
        assert!(result.is_err());
    }
}
