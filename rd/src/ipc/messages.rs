//! IPC message types for daemon communication
//!
//! Simple JSON-over-newline protocol. Each message is a single line of JSON followed by `\n`.

use serde::{Deserialize, Serialize};

use crate::domain::{CreateTaskRequest, TaskKey, TaskSnapshot, TaskSummary};
use crate::registry::RegistryError;

/// Maximum message size in either direction
///
/// Large enough for a create request carrying a full payload list.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Messages from CLI to Daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonMessage {
    /// Register a new dispatch task
    CreateTask(CreateTaskRequest),

    /// Stop a task and drop it from the registry
    StopTask { key: TaskKey },

    /// Snapshot of one task
    GetTaskStatus { key: TaskKey },

    /// Summaries of all registered tasks
    ListActiveTasks,

    /// Stop every registered task
    StopAllTasks,

    /// Ping to check if daemon is alive
    Ping,

    /// Request daemon to stop gracefully
    Shutdown,
}

/// Responses from Daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    /// Acknowledgment
    Ok,

    /// Task registered
    Created { key: TaskKey },

    /// Task snapshot
    Status { snapshot: TaskSnapshot },

    /// Task listing
    Tasks { tasks: Vec<TaskSummary> },

    /// Keys stopped by `StopAllTasks`
    Stopped { keys: Vec<TaskKey> },

    /// Pong response to ping
    Pong { version: String },

    /// Error response
    Error { kind: String, message: String },
}

impl DaemonResponse {
    /// Error response for a malformed or unreadable request
    pub fn bad_request(message: impl Into<String>) -> Self {
        DaemonResponse::Error {
            kind: "BadRequest".to_string(),
            message: message.into(),
        }
    }
}

impl From<RegistryError> for DaemonResponse {
    fn from(err: RegistryError) -> Self {
        DaemonResponse::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
