//! MessageSender trait definition

use async_trait::async_trait;

use super::SendError;

/// Delivers one formatted text to a remote destination
///
/// Each call is a single authenticated request. Implementations report
/// failure through [`SendError`]; they must not panic on remote errors.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `text` to `target_id`, authenticating with `credential`
    async fn send_text(&self, credential: &str, target_id: &str, text: &str) -> Result<(), SendError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// One call observed by [`MockSender`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMessage {
        pub credential: String,
        pub target_id: String,
        pub text: String,
    }

    /// Mock sender for unit tests
    ///
    /// Records every call; fails every call whose 0-based index is listed in
    /// `fail_on`.
    #[derive(Default)]
    pub struct MockSender {
        sent: Mutex<Vec<SentMessage>>,
        call_count: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl MockSender {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(fail_on: Vec<usize>) -> Self {
            Self {
                fail_on,
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSender for MockSender {
        async fn send_text(&self, credential: &str, target_id: &str, text: &str) -> Result<(), SendError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, %target_id, "MockSender::send_text: called");
            self.sent.lock().unwrap().push(SentMessage {
                credential: credential.to_string(),
                target_id: target_id.to_string(),
                text: text.to_string(),
            });
            if self.fail_on.contains(&idx) {
                return Err(SendError::Rejected {
                    status: 500,
                    message: format!("mock failure {}", idx),
                });
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_sender_records_calls() {
            let sender = MockSender::new();

            sender.send_text("tok", "t1", "a").await.unwrap();
            sender.send_text("tok", "t1", "b").await.unwrap();

            assert_eq!(sender.call_count(), 2);
            assert_eq!(sender.sent()[1].text, "b");
        }

        #[tokio::test]
        async fn test_mock_sender_fails_on_listed_calls() {
            let sender = MockSender::failing_on(vec![1]);

            assert!(sender.send_text("tok", "t1", "a").await.is_ok());
            assert!(sender.send_text("tok", "t1", "b").await.is_err());
            assert!(sender.send_text("tok", "t1", "c").await.is_ok());
        }
    }
}
