//! RelayDaemon - concurrent paced message dispatch
//!
//! CLI entry point for running the daemon and controlling its tasks.

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relaydaemon::cli::{Cli, Command, OutputFormat, get_log_path};
use relaydaemon::config::Config;
use relaydaemon::daemon::run_daemon;
use relaydaemon::domain::{CreateTaskRequest, TaskKey, TaskSnapshot, TaskSummary};
use relaydaemon::ingest::read_lines;
use relaydaemon::ipc::{self, DaemonClient};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let socket_path = cli.socket.clone().unwrap_or_else(ipc::get_socket_path);
    let client = DaemonClient::with_socket_path(socket_path.clone());

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve => cmd_serve(&config, &socket_path).await,
        Command::Create {
            target,
            prefix,
            suffix,
            delay,
            token,
            token_file,
            messages,
        } => {
            let credentials = match (token, token_file) {
                (Some(token), _) => vec![token],
                (None, Some(path)) => read_lines(&path)?,
                (None, None) => Vec::new(),
            };
            let request = CreateTaskRequest {
                credentials,
                target_id: target,
                decorator_prefix: prefix,
                decorator_suffix: suffix,
                delay_seconds: delay,
                payloads: read_lines(&messages)?,
            };
            cmd_create(&client, request).await
        }
        Command::Stop { key } => {
            client.stop_task(&TaskKey::from(key.as_str())).await?;
            println!("Stopped {}", key);
            Ok(())
        }
        Command::Status { key, format } => {
            let snapshot = client.get_task_status(&TaskKey::from(key.as_str())).await?;
            print_snapshot(&snapshot, format)
        }
        Command::List { format } => {
            let tasks = client.list_tasks().await?;
            print_tasks(&tasks, format)
        }
        Command::StopAll => {
            let keys = client.stop_all_tasks().await?;
            println!("Stopped {} task(s)", keys.len());
            for key in keys {
                println!("  {}", key);
            }
            Ok(())
        }
        Command::Ping => {
            let version = client.ping().await?;
            println!("Daemon is running (version {})", version);
            Ok(())
        }
        Command::Shutdown => {
            client.shutdown().await?;
            println!("Shutdown requested");
            Ok(())
        }
    }
}

/// Run the daemon in the foreground until a signal or a `Shutdown` request
async fn cmd_serve(config: &Config, socket_path: &Path) -> Result<()> {
    debug!(?socket_path, "cmd_serve: called");

    let probe = DaemonClient::with_socket_path(socket_path.to_path_buf()).with_timeout(Duration::from_secs(1));
    if probe.socket_exists() && probe.ping().await.is_ok() {
        return Err(eyre::eyre!("A daemon is already listening on {}", socket_path.display()));
    }

    let shutdown = CancellationToken::new();
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => warn!("SIGINT received"),
            _ = sigterm.recv() => warn!("SIGTERM received"),
            _ = signal_token.cancelled() => return,
        }
        signal_token.cancel();
    });

    println!("relaydaemon listening on {}", socket_path.display());
    println!("Logs are written to: {}", get_log_path().display());
    run_daemon(config, socket_path, shutdown).await
}

async fn cmd_create(client: &DaemonClient, request: CreateTaskRequest) -> Result<()> {
    debug!(
        target_id = %request.target_id,
        credentials = request.credentials.len(),
        payloads = request.payloads.len(),
        "cmd_create: called"
    );
    let key = client.create_task(request).await?;
    println!("{}", key);
    Ok(())
}

fn print_snapshot(snapshot: &TaskSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?);
        }
        OutputFormat::Text => {
            println!("Task:        {}", snapshot.key);
            println!("Status:      {}", snapshot.status);
            println!("Target:      {}", snapshot.target_id);
            println!("Sent:        {}", snapshot.sent_count);
            println!("Cycles:      {}", snapshot.cycles);
            println!("Credentials: {}", snapshot.credential_count);
            println!("Payloads:    {}", snapshot.payload_count);
            println!("Created:     {}", snapshot.created_at.to_rfc3339());
            if let Some(err) = &snapshot.last_error {
                println!("Last error:  {}", err);
            }
        }
    }
    Ok(())
}

fn print_tasks(tasks: &[TaskSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tasks).context("Failed to serialize tasks")?);
        }
        OutputFormat::Text => {
            if tasks.is_empty() {
                println!("No tasks");
                return Ok(());
            }
            println!("{:<24} {:<8} {:>10}", "KEY", "STATUS", "SENT");
            for task in tasks {
                println!("{:<24} {:<8} {:>10}", task.key.as_str(), task.status.to_string(), task.sent_count);
            }
        }
    }
    Ok(())
}
