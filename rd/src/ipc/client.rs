//! IPC client for communicating with the daemon
//!
//! Provides a simple interface for the CLI to send requests to the daemon
//! via Unix Domain Socket.

use std::path::PathBuf;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

use super::get_socket_path;
use super::messages::{DaemonMessage, DaemonResponse, MAX_MESSAGE_SIZE};
use crate::domain::{CreateTaskRequest, TaskKey, TaskSnapshot, TaskSummary};

/// Default timeout for IPC operations
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for communicating with the daemon via IPC
#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl Default for DaemonClient {
    fn default() -> Self {
        Self::new()
    }
}

fn unexpected(response: DaemonResponse) -> eyre::Report {
    match response {
        DaemonResponse::Error { kind, message } => eyre::eyre!("Daemon error ({}): {}", kind, message),
        other => eyre::eyre!("Unexpected response: {:?}", other),
    }
}

impl DaemonClient {
    /// Create a new client with the default socket path
    pub fn new() -> Self {
        Self {
            socket_path: get_socket_path(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a client with a custom socket path
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if the daemon socket exists
    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Register a new dispatch task and return its key
    pub async fn create_task(&self, request: CreateTaskRequest) -> Result<TaskKey> {
        debug!(target_id = %request.target_id, "DaemonClient: creating task");
        match self.send_message(DaemonMessage::CreateTask(request)).await? {
            DaemonResponse::Created { key } => Ok(key),
            other => Err(unexpected(other)),
        }
    }

    /// Stop a task by key
    pub async fn stop_task(&self, key: &TaskKey) -> Result<()> {
        debug!(%key, "DaemonClient: stopping task");
        let msg = DaemonMessage::StopTask { key: key.clone() };
        match self.send_message(msg).await? {
            DaemonResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Fetch a task snapshot
    pub async fn get_task_status(&self, key: &TaskKey) -> Result<TaskSnapshot> {
        debug!(%key, "DaemonClient: getting task status");
        let msg = DaemonMessage::GetTaskStatus { key: key.clone() };
        match self.send_message(msg).await? {
            DaemonResponse::Status { snapshot } => Ok(snapshot),
            other => Err(unexpected(other)),
        }
    }

    /// List all registered tasks
    pub async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        debug!("DaemonClient: listing tasks");
        match self.send_message(DaemonMessage::ListActiveTasks).await? {
            DaemonResponse::Tasks { tasks } => Ok(tasks),
            other => Err(unexpected(other)),
        }
    }

    /// Stop every task, returning the keys that were stopped
    pub async fn stop_all_tasks(&self) -> Result<Vec<TaskKey>> {
        debug!("DaemonClient: stopping all tasks");
        match self.send_message(DaemonMessage::StopAllTasks).await? {
            DaemonResponse::Stopped { keys } => Ok(keys),
            other => Err(unexpected(other)),
        }
    }

    /// Check if daemon is alive and get its version
    pub async fn ping(&self) -> Result<String> {
        debug!("DaemonClient: pinging daemon");
        match self.send_message(DaemonMessage::Ping).await? {
            DaemonResponse::Pong { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon to shutdown gracefully
    pub async fn shutdown(&self) -> Result<()> {
        debug!("DaemonClient: requesting daemon shutdown");
        match self.send_message(DaemonMessage::Shutdown).await? {
            DaemonResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Send a message to the daemon and wait for response
    async fn send_message(&self, msg: DaemonMessage) -> Result<DaemonResponse> {
        debug!(socket_path = ?self.socket_path, "DaemonClient: sending message");

        let stream = tokio::time::timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timeout")?
            .context(format!(
                "Failed to connect to daemon socket {} (is `rd serve` running?)",
                self.socket_path.display()
            ))?;

        self.send_on_stream(stream, msg).await
    }

    async fn send_on_stream(&self, mut stream: UnixStream, msg: DaemonMessage) -> Result<DaemonResponse> {
        let msg_json = serde_json::to_string(&msg).context("Failed to serialize message")?;

        if msg_json.len() > MAX_MESSAGE_SIZE {
            return Err(eyre::eyre!("Message too large: {} bytes", msg_json.len()));
        }

        tokio::time::timeout(self.timeout, async {
            stream
                .write_all(msg_json.as_bytes())
                .await
                .context("Failed to write message")?;
            stream.write_all(b"\n").await.context("Failed to write newline")?;
            stream.flush().await.context("Failed to flush stream")?;
            Ok::<_, eyre::Error>(())
        })
        .await
        .context("Write timeout")??;

        let mut reader = BufReader::new(&mut stream).take(MAX_MESSAGE_SIZE as u64 + 1);
        let mut response_line = String::new();

        tokio::time::timeout(self.timeout, async {
            let bytes_read = reader
                .read_line(&mut response_line)
                .await
                .context("Failed to read response")?;

            if bytes_read > MAX_MESSAGE_SIZE {
                return Err(eyre::eyre!("Response too large: more than {} bytes", MAX_MESSAGE_SIZE));
            }

            Ok::<_, eyre::Error>(())
        })
        .await
        .context("Read timeout")??;

        let response: DaemonResponse =
            serde_json::from_str(response_line.trim()).context("Failed to parse daemon response")?;

        debug!(?response, "DaemonClient: received response");
        Ok(response)
    }
}
