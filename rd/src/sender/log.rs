//! Dry-run sender that only logs

use async_trait::async_trait;
use tracing::info;

use super::{MessageSender, SendError};

/// Logs every message instead of delivering it
#[derive(Debug, Default, Clone)]
pub struct LogSender;

#[async_trait]
impl MessageSender for LogSender {
    async fn send_text(&self, _credential: &str, target_id: &str, text: &str) -> Result<(), SendError> {
        info!(%target_id, %text, "dry-run send");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let sender = LogSender;
        assert!(sender.send_text("tok", "room", "hello").await.is_ok());
    }
}
