//! Inter-Process Communication with the daemon
//!
//! This module provides the Unix Domain Socket control surface. The CLI
//! connects to the daemon's socket, sends one request and reads one response.

use std::path::PathBuf;

pub mod client;
pub mod listener;
pub mod messages;

pub use client::DaemonClient;
pub use listener::{cleanup_socket, create_listener, create_listener_at, handle_message, serve};
pub use messages::{DaemonMessage, DaemonResponse, MAX_MESSAGE_SIZE};

/// Get the socket path for daemon IPC
pub fn get_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("relaydaemon")
        .join("daemon.sock")
}
