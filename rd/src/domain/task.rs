//! Task domain types
//!
//! A task is one registered dispatch unit: an immutable [`TaskConfig`] plus the
//! live [`DispatchProgress`] its loop publishes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::key::TaskKey;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Loop is dispatching
    #[default]
    Running,
    /// Stop was requested; terminal. Stopped tasks leave the registry, so
    /// this only appears in the wire format.
    Stopped,
}

impl TaskStatus {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Caller-supplied parameters for a new task, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Credentials to rotate through, one per outbound call
    pub credentials: Vec<String>,

    /// Remote destination identifier
    pub target_id: String,

    /// String placed before every payload
    #[serde(default)]
    pub decorator_prefix: String,

    /// String placed after every payload
    #[serde(default)]
    pub decorator_suffix: String,

    /// Pause between consecutive sends, in seconds
    pub delay_seconds: f64,

    /// Raw messages, sent in order
    pub payloads: Vec<String>,
}

/// Validated, immutable task configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub credentials: Vec<String>,
    pub target_id: String,
    pub decorator_prefix: String,
    pub decorator_suffix: String,
    pub delay: Duration,
    pub payloads: Vec<String>,
}

impl TaskConfig {
    /// Validate a request into a config
    ///
    /// Returns a human-readable reason on rejection.
    pub fn from_request(request: CreateTaskRequest) -> Result<Self, String> {
        if request.credentials.is_empty() {
            return Err("at least one credential is required".to_string());
        }
        if request.payloads.is_empty() {
            return Err("at least one payload is required".to_string());
        }
        if request.target_id.trim().is_empty() {
            return Err("target id must not be empty".to_string());
        }
        let delay = Duration::try_from_secs_f64(request.delay_seconds)
            .map_err(|e| format!("invalid delay {}: {}", request.delay_seconds, e))?;

        Ok(Self {
            credentials: request.credentials,
            target_id: request.target_id.trim().to_string(),
            decorator_prefix: request.decorator_prefix,
            decorator_suffix: request.decorator_suffix,
            delay,
            payloads: request.payloads,
        })
    }
}

/// Live counters published by a dispatch loop after every attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchProgress {
    /// Send attempts so far, successful or not
    pub sent_count: u64,

    /// Index of the credential used for the next send
    pub credential_cursor: usize,

    /// Index of the payload used for the next send
    pub payload_cursor: usize,

    /// Completed passes over the payload list
    pub cycles: u64,

    /// Most recent send failure, if any
    pub last_error: Option<String>,
}

/// Point-in-time view of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub key: TaskKey,
    pub status: TaskStatus,
    pub sent_count: u64,
    pub is_running: bool,
    pub target_id: String,
    pub credential_count: usize,
    pub payload_count: usize,
    pub cycles: u64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row in a task listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub key: TaskKey,
    pub status: TaskStatus,
    pub sent_count: u64,
}
