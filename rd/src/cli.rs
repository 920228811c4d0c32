//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// RelayDaemon - concurrent paced message dispatch
#[derive(Parser)]
#[command(
    name = "rd",
    about = "Run and control paced message dispatch tasks",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Override the daemon socket path
    #[arg(short, long, global = true, help = "Path to the daemon socket")]
    pub socket: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the daemon in the foreground
    Serve,

    /// Create a dispatch task
    Create {
        /// Destination conversation or channel id
        #[arg(short, long)]
        target: String,

        /// Text placed before every payload
        #[arg(long, default_value = "")]
        prefix: String,

        /// Text placed after every payload
        #[arg(long, default_value = "")]
        suffix: String,

        /// Seconds to wait between sends
        #[arg(short, long)]
        delay: f64,

        /// Single credential
        #[arg(long, conflicts_with = "token_file", required_unless_present = "token_file")]
        token: Option<String>,

        /// File with one credential per line
        #[arg(long)]
        token_file: Option<PathBuf>,

        /// File with one payload per line
        #[arg(short, long)]
        messages: PathBuf,
    },

    /// Stop a task
    Stop {
        /// Task key
        key: String,
    },

    /// Show a task snapshot
    Status {
        /// Task key
        key: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List registered tasks
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Stop every task
    StopAll,

    /// Ping the daemon to check if it's alive and responsive
    Ping,

    /// Ask the daemon to shut down gracefully
    Shutdown,
}

/// Output format for status/list commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Path of the daemon log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("relaydaemon")
        .join("logs")
        .join("relaydaemon.log")
}
