//! IPC listener for the daemon side
//!
//! Binds the Unix Domain Socket, reads one request per connection and maps it
//! onto the task registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::get_socket_path;
use super::messages::{DaemonMessage, DaemonResponse, MAX_MESSAGE_SIZE};
use crate::registry::TaskRegistry;

/// How long `serve` waits for in-flight connections after shutdown
pub const CONNECTION_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Create and bind a Unix Domain Socket listener for the daemon
///
/// Handles cleanup of stale socket files from previous runs.
pub fn create_listener() -> Result<(UnixListener, PathBuf)> {
    let socket_path = get_socket_path();
    create_listener_at(&socket_path)
}

/// Create a listener at a specific path
pub fn create_listener_at(socket_path: &Path) -> Result<(UnixListener, PathBuf)> {
    debug!(?socket_path, "create_listener: creating IPC socket");

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create socket directory")?;
    }

    if socket_path.exists() {
        debug!(?socket_path, "create_listener: removing stale socket");
        std::fs::remove_file(socket_path).context("Failed to remove stale socket")?;
    }

    let listener = UnixListener::bind(socket_path).context("Failed to bind IPC socket")?;
    debug!(?socket_path, "create_listener: socket bound successfully");

    Ok((listener, socket_path.to_path_buf()))
}

/// Remove the socket file on shutdown
pub fn cleanup_socket(socket_path: &Path) {
    if socket_path.exists() {
        debug!(?socket_path, "cleanup_socket: removing socket file");
        if let Err(e) = std::fs::remove_file(socket_path) {
            warn!(?socket_path, error = %e, "Failed to remove socket file");
        }
    }
}

/// Read a single newline-terminated request from the stream
pub async fn read_message(stream: &mut UnixStream) -> Result<DaemonMessage> {
    // One byte over the limit is enough to tell an oversized line apart
    let mut reader = BufReader::new(stream).take(MAX_MESSAGE_SIZE as u64 + 1);
    let mut line = String::new();

    let bytes_read = reader
        .read_line(&mut line)
        .await
        .context("Failed to read IPC message")?;

    if bytes_read > MAX_MESSAGE_SIZE {
        return Err(eyre::eyre!("Message too large: more than {} bytes", MAX_MESSAGE_SIZE));
    }

    if line.trim().is_empty() {
        return Err(eyre::eyre!("Empty message received"));
    }

    let msg: DaemonMessage = serde_json::from_str(line.trim()).context("Failed to parse IPC message")?;
    debug!(?msg, "read_message: parsed message");

    Ok(msg)
}

/// Send a response on the stream
pub async fn send_response(stream: &mut UnixStream, response: DaemonResponse) -> Result<()> {
    let response_json = serde_json::to_string(&response).context("Failed to serialize response")?;
    stream
        .write_all(response_json.as_bytes())
        .await
        .context("Failed to write response")?;
    stream.write_all(b"\n").await.context("Failed to write newline")?;
    stream.flush().await.context("Failed to flush response")?;
    debug!(?response, "send_response: sent response");
    Ok(())
}

/// Map a request onto the registry and build the response
///
/// `Shutdown` only cancels `shutdown`; draining the registry is left to
/// whoever owns the serve loop.
pub async fn handle_message(
    msg: DaemonMessage,
    registry: &TaskRegistry,
    shutdown: &CancellationToken,
) -> DaemonResponse {
    debug!(?msg, "handle_message: called");
    match msg {
        DaemonMessage::CreateTask(request) => match registry.create(request).await {
            Ok(key) => DaemonResponse::Created { key },
            Err(e) => e.into(),
        },
        DaemonMessage::StopTask { key } => match registry.stop(&key).await {
            Ok(()) => DaemonResponse::Ok,
            Err(e) => e.into(),
        },
        DaemonMessage::GetTaskStatus { key } => match registry.get(&key).await {
            Ok(snapshot) => DaemonResponse::Status { snapshot },
            Err(e) => e.into(),
        },
        DaemonMessage::ListActiveTasks => DaemonResponse::Tasks {
            tasks: registry.list().await,
        },
        DaemonMessage::StopAllTasks => DaemonResponse::Stopped {
            keys: registry.stop_all().await,
        },
        DaemonMessage::Ping => DaemonResponse::Pong {
            version: crate::VERSION.to_string(),
        },
        DaemonMessage::Shutdown => {
            info!("Shutdown requested over IPC");
            shutdown.cancel();
            DaemonResponse::Ok
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    registry: Arc<TaskRegistry>,
    shutdown: CancellationToken,
) -> Result<()> {
    let response = match read_message(&mut stream).await {
        Ok(msg) => handle_message(msg, &registry, &shutdown).await,
        Err(e) => {
            warn!(error = %e, "Rejecting bad IPC request");
            DaemonResponse::bad_request(format!("{:#}", e))
        }
    };
    send_response(&mut stream, response).await
}

/// Accept connections until `shutdown` is cancelled
///
/// Each connection is handled on its own task so a slow client cannot block
/// the accept loop. On shutdown, in-flight connections get
/// [`CONNECTION_DRAIN_TIMEOUT`] to finish writing their response.
pub async fn serve(listener: UnixListener, registry: Arc<TaskRegistry>, shutdown: CancellationToken) {
    debug!("serve: called");
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("serve: shutdown signalled");
                break;
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let registry = Arc::clone(&registry);
                    let shutdown = shutdown.clone();
                    connections.spawn(async move {
                        if let Err(e) = handle_connection(stream, registry, shutdown).await {
                            warn!(error = %e, "IPC connection failed");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept IPC connection");
                }
            }
        }
    }

    let drain = async { while connections.join_next().await.is_some() {} };
    if tokio::time::timeout(CONNECTION_DRAIN_TIMEOUT, drain).await.is_err() {
        debug!(remaining = connections.len(), "serve: aborting unfinished connections");
        connections.abort_all();
    }
}
