//! Daemon runtime: wires config, sender, registry and the IPC listener

use std::path::Path;
use std::sync::Arc;

use eyre::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::ipc;
use crate::registry::TaskRegistry;
use crate::sender::create_sender;

/// Run the daemon until `shutdown` is cancelled
///
/// `shutdown` is cancelled either by the caller (signals) or by a `Shutdown`
/// request over IPC. Running tasks are then stopped and given
/// `dispatch.shutdown-timeout-ms` to wind down before they are aborted.
pub async fn run_daemon(config: &Config, socket_path: &Path, shutdown: CancellationToken) -> Result<()> {
    debug!(?socket_path, "run_daemon: called");
    info!("Daemon starting...");

    let pacing = config.dispatch.pacing();
    let sender = create_sender(&config.sender, pacing.send_timeout).context("Failed to create message sender")?;
    info!(provider = %config.sender.provider, "Sender initialized");

    let registry = Arc::new(TaskRegistry::new(sender, pacing));
    info!(pacing = ?registry.pacing(), "Task registry ready");
    let (listener, socket_path) = ipc::create_listener_at(socket_path)?;
    info!(?socket_path, "IPC listener bound");

    ipc::serve(listener, Arc::clone(&registry), shutdown).await;

    info!("Daemon shutting down...");
    let aborted = registry.shutdown(config.dispatch.shutdown_timeout()).await;
    if aborted > 0 {
        warn!(aborted, "Tasks aborted after shutdown timeout");
    }

    debug!("run_daemon: cleaning up IPC socket");
    ipc::cleanup_socket(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
