//! Registry error types

use thiserror::Error;

/// Errors returned by control operations on the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid task config: {0}")]
    InvalidConfig(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Registry is shutting down")]
    ShuttingDown,
}

impl RegistryError {
    /// Stable machine-readable name, used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::InvalidConfig(_) => "InvalidConfig",
            RegistryError::NotFound(_) => "NotFound",
            RegistryError::ShuttingDown => "ShuttingDown",
        }
    }
}
