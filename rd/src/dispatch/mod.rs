//! Per-task dispatch: payload formatting, cursor rotation and the send loop

mod engine;
mod format;
mod rotation;

pub use engine::{DispatchExit, DispatchLoop, DispatchMode};
pub use format::{SEPARATOR, format_payload};
pub use rotation::Rotation;
