//! Domain types for relaydaemon

mod key;
mod task;

pub use key::{KEY_DIGITS, KEY_PREFIX, TaskKey, generate_key};
pub use task::{CreateTaskRequest, DispatchProgress, TaskConfig, TaskSnapshot, TaskStatus, TaskSummary};
