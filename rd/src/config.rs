//! relaydaemon configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main relaydaemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dispatch loop pacing
    pub dispatch: DispatchConfig,

    /// Outbound sender configuration
    pub sender: SenderConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .relaydaemon.yml
        let local_config = PathBuf::from(".relaydaemon.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/relaydaemon/relaydaemon.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("relaydaemon").join("relaydaemon.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Dispatch loop pacing
///
/// The quiet period and send timeout defaults match the remote endpoint's
/// limit of two calls per minute per credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Pause after each full pass over the payload list, in milliseconds
    #[serde(rename = "quiet-period-ms")]
    pub quiet_period_ms: u64,

    /// Upper bound on a single outbound call, in milliseconds
    ///
    /// The only send deadline: the HTTP sender's client timeout is set from it.
    #[serde(rename = "send-timeout-ms")]
    pub send_timeout_ms: u64,

    /// Pause after an unexpected loop error, in milliseconds
    #[serde(rename = "error-cooldown-ms")]
    pub error_cooldown_ms: u64,

    /// How long daemon shutdown waits for loops to exit, in milliseconds
    #[serde(rename = "shutdown-timeout-ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 30_000,
            send_timeout_ms: 30_000,
            error_cooldown_ms: 5_000,
            shutdown_timeout_ms: 10_000,
        }
    }
}

impl DispatchConfig {
    /// Convert to the pacing used by dispatch loops
    pub fn pacing(&self) -> PacingConfig {
        PacingConfig {
            quiet_period: Duration::from_millis(self.quiet_period_ms),
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            error_cooldown: Duration::from_millis(self.error_cooldown_ms),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Timing shared by every dispatch loop in a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    pub quiet_period: Duration,
    pub send_timeout: Duration,
    pub error_cooldown: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        DispatchConfig::default().pacing()
    }
}

/// Outbound sender configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Sender implementation: "http" or "log"
    pub provider: String,

    /// Base URL for the HTTP sender; the target id is appended as a path segment
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            provider: "http".to_string(),
            base_url: "http://127.0.0.1:8080/messages".to_string(),
        }
    }
}
