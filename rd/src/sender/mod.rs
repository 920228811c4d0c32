//! Outbound message delivery
//!
//! Dispatch loops talk to the remote endpoint only through [`MessageSender`].

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

pub mod client;
mod error;
mod http;
mod log;

pub use client::MessageSender;
pub use error::SendError;
pub use http::HttpSender;
pub use log::LogSender;

use crate::config::SenderConfig;

/// Create a sender based on the provider specified in config
///
/// Supports "http" and "log" providers. `send_timeout` is the dispatch send
/// deadline (`dispatch.send-timeout-ms`).
pub fn create_sender(config: &SenderConfig, send_timeout: Duration) -> Result<Arc<dyn MessageSender>, SendError> {
    debug!(provider = %config.provider, ?send_timeout, "create_sender: called");
    match config.provider.as_str() {
        "http" => Ok(Arc::new(HttpSender::from_config(config, send_timeout)?)),
        "log" => Ok(Arc::new(LogSender)),
        other => Err(SendError::InvalidConfig(format!(
            "Unknown sender provider: '{}'. Supported: http, log",
            other
        ))),
    }
}
