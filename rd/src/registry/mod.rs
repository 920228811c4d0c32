//! Task registry - the set of live dispatch tasks
//!
//! Every map mutation and snapshot read goes through one mutex. Dispatch
//! loops never touch the registry; they publish progress over their own
//! `watch` channel, which the registry reads when asked for a snapshot.

mod core;
mod error;

pub use self::core::TaskRegistry;
pub use error::RegistryError;
