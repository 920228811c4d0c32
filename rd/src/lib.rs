//! RelayDaemon - concurrent paced message dispatch
//!
//! RelayDaemon runs many independent dispatch tasks at once. Each task walks a
//! list of payloads, decorates every one with a prefix and suffix, and delivers
//! it to a single target through a pluggable sender, rotating credentials as it
//! goes. Tasks are registered, inspected and stopped through a small JSON
//! control protocol on a Unix socket.
//!
//! # Modules
//!
//! - [`domain`] - Task keys, task configuration and snapshots
//! - [`dispatch`] - Payload formatting, rotation and the dispatch loop
//! - [`sender`] - Message sender trait and implementations
//! - [`registry`] - The set of live tasks and their control operations
//! - [`ipc`] - Unix socket protocol, listener and client
//! - [`ingest`] - Line-oriented credential and payload files
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod daemon;
pub mod dispatch;
pub mod domain;
pub mod ingest;
pub mod ipc;
pub mod registry;
pub mod sender;

/// Version reported by `rd --version` and the `Ping` response
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types
pub use config::{Config, DispatchConfig, PacingConfig, SenderConfig};
pub use dispatch::{DispatchExit, DispatchLoop, DispatchMode, Rotation, SEPARATOR, format_payload};
pub use domain::{
    CreateTaskRequest, DispatchProgress, TaskConfig, TaskKey, TaskSnapshot, TaskStatus, TaskSummary, generate_key,
};
pub use ipc::{DaemonClient, DaemonMessage, DaemonResponse};
pub use registry::{RegistryError, TaskRegistry};
pub use sender::{HttpSender, LogSender, MessageSender, SendError, create_sender};
