//! Integration tests for RelayDaemon
//!
//! These tests drive the registry and the IPC surface through the public API
//! only, with a recording sender standing in for the remote endpoint.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use relaydaemon::config::PacingConfig;
use relaydaemon::domain::{CreateTaskRequest, TaskStatus};
use relaydaemon::ipc::{DaemonClient, create_listener_at, serve};
use relaydaemon::registry::{RegistryError, TaskRegistry};
use relaydaemon::sender::{MessageSender, SendError};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Helpers
// =============================================================================

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingSender {
    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, credential: &str, target_id: &str, text: &str) -> Result<(), SendError> {
        self.sent
            .lock()
            .unwrap()
            .push((credential.to_string(), target_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Rejects every send
struct RejectingSender;

#[async_trait]
impl MessageSender for RejectingSender {
    async fn send_text(&self, _credential: &str, _target_id: &str, _text: &str) -> Result<(), SendError> {
        Err(SendError::Rejected {
            status: 429,
            message: "slow down".to_string(),
        })
    }
}

fn pacing(quiet_period: Duration) -> PacingConfig {
    PacingConfig {
        quiet_period,
        send_timeout: Duration::from_secs(30),
        error_cooldown: Duration::from_secs(5),
    }
}

fn request(credentials: &[&str], payloads: &[&str], delay_seconds: f64) -> CreateTaskRequest {
    CreateTaskRequest {
        credentials: credentials.iter().map(|s| s.to_string()).collect(),
        target_id: "room-7".to_string(),
        decorator_prefix: "ops".to_string(),
        decorator_suffix: "bot".to_string(),
        delay_seconds,
        payloads: payloads.iter().map(|s| s.to_string()).collect(),
    }
}

// =============================================================================
// Registry Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_round_robin_pairs_credentials_with_payloads() {
    let sender = Arc::new(RecordingSender::default());
    let registry = TaskRegistry::new(sender.clone(), pacing(Duration::from_secs(30)));

    let key = registry
        .create(request(&["tokA", "tokB"], &["hi", "bye"], 1.0))
        .await
        .unwrap();

    // t=0 first send, t=1 second send, then delay + quiet period until t=32
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(
        sender.sent(),
        vec![
            ("tokA".to_string(), "room-7".to_string(), "ops___hi___bot".to_string()),
            ("tokB".to_string(), "room-7".to_string(), "ops___bye___bot".to_string()),
        ]
    );

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(sender.sent().len(), 2, "quiet period should hold the next send");

    tokio::time::sleep(Duration::from_secs(11)).await;
    let sent = sender.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].0, "tokA");
    assert_eq!(sent[2].2, "ops___hi___bot");

    let snapshot = registry.get(&key).await.unwrap();
    assert_eq!(snapshot.sent_count, 3);
    assert_eq!(snapshot.cycles, 1);
    assert_eq!(snapshot.status, TaskStatus::Running);

    registry.stop(&key).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_sends_still_count() {
    let registry = TaskRegistry::new(Arc::new(RejectingSender), pacing(Duration::from_secs(30)));

    let key = registry.create(request(&["tokA", "tokB"], &["hi"], 1.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let snapshot = registry.get(&key).await.unwrap();
    assert_eq!(snapshot.sent_count, 1);
    assert!(snapshot.last_error.is_some());
    assert!(snapshot.is_running);

    registry.stop(&key).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_sending() {
    let sender = Arc::new(RecordingSender::default());
    let registry = TaskRegistry::new(sender.clone(), pacing(Duration::from_secs(30)));

    let key = registry.create(request(&["tokA"], &["a", "b", "c"], 2.0)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    registry.stop(&key).await.unwrap();

    let count = sender.sent().len();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(sender.sent().len(), count);

    assert_eq!(registry.get(&key).await, Err(RegistryError::NotFound(key.to_string())));
    assert!(registry.list().await.is_empty());
}

#[tokio::test]
async fn test_invalid_requests_leave_registry_empty() {
    let registry = TaskRegistry::new(Arc::new(RecordingSender::default()), pacing(Duration::from_secs(30)));

    let no_credentials = registry.create(request(&[], &["hi"], 1.0)).await;
    assert!(matches!(no_credentials, Err(RegistryError::InvalidConfig(_))));

    let no_payloads = registry.create(request(&["tokA"], &[], 1.0)).await;
    assert!(matches!(no_payloads, Err(RegistryError::InvalidConfig(_))));

    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_shutdown_drains_registry() {
    let registry = TaskRegistry::new(Arc::new(RecordingSender::default()), pacing(Duration::from_millis(50)));

    for _ in 0..5 {
        registry.create(request(&["tokA"], &["hi"], 0.01)).await.unwrap();
    }
    assert_eq!(registry.len().await, 5);

    let aborted = registry.shutdown(Duration::from_secs(5)).await;
    assert_eq!(aborted, 0);
    assert!(registry.is_empty().await);
    assert_eq!(
        registry.create(request(&["tokA"], &["hi"], 0.01)).await,
        Err(RegistryError::ShuttingDown)
    );
}

// =============================================================================
// IPC Tests
// =============================================================================

#[tokio::test]
async fn test_ipc_full_session() {
    let temp = TempDir::new().unwrap();
    let socket_path = temp.path().join("daemon.sock");
    let (listener, _) = create_listener_at(&socket_path).unwrap();

    let sender = Arc::new(RecordingSender::default());
    let registry = Arc::new(TaskRegistry::new(sender.clone(), pacing(Duration::from_millis(50))));
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(listener, Arc::clone(&registry), shutdown.clone()));

    let client = DaemonClient::with_socket_path(socket_path);
    assert_eq!(client.ping().await.unwrap(), relaydaemon::VERSION);

    let key = client
        .create_task(request(&["tokA", "tokB"], &["hi", "bye"], 0.01))
        .await
        .unwrap();

    let mut sent_count = 0;
    for _ in 0..100 {
        sent_count = client.get_task_status(&key).await.unwrap().sent_count;
        if sent_count >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(sent_count >= 2);

    let tasks = client.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].key, key);
    assert_eq!(tasks[0].status, TaskStatus::Running);

    let stopped = client.stop_all_tasks().await.unwrap();
    assert_eq!(stopped, vec![key.clone()]);
    assert!(client.list_tasks().await.unwrap().is_empty());

    let err = client.stop_task(&key).await.unwrap_err();
    assert!(err.to_string().contains("NotFound"));

    let sent = sender.sent();
    assert_eq!(sent[0].0, "tokA");
    assert_eq!(sent[1].0, "tokB");

    client.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("serve loop should exit after Shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_ipc_invalid_create_reports_kind() {
    let temp = TempDir::new().unwrap();
    let socket_path = temp.path().join("daemon.sock");
    let (listener, _) = create_listener_at(&socket_path).unwrap();

    let registry = Arc::new(TaskRegistry::new(
        Arc::new(RecordingSender::default()),
        pacing(Duration::from_millis(50)),
    ));
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(listener, Arc::clone(&registry), shutdown.clone()));

    let client = DaemonClient::with_socket_path(socket_path);
    let err = client.create_task(request(&[], &["hi"], 1.0)).await.unwrap_err();
    assert!(err.to_string().contains("InvalidConfig"));
    assert!(registry.is_empty().await);

    shutdown.cancel();
    server.await.unwrap();
}
