//! TaskRegistry implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PacingConfig;
use crate::dispatch::{DispatchExit, DispatchLoop};
use crate::domain::{
    CreateTaskRequest, DispatchProgress, TaskConfig, TaskKey, TaskSnapshot, TaskStatus, TaskSummary, generate_key,
};
use crate::sender::MessageSender;

use super::RegistryError;

/// A registered task: its config, its stop signal, and a view of its loop
struct TaskEntry {
    config: Arc<TaskConfig>,
    cancel: CancellationToken,
    progress: watch::Receiver<DispatchProgress>,
    join: JoinHandle<DispatchExit>,
    created_at: DateTime<Utc>,
}

impl TaskEntry {
    /// Entries leave the map under the lock before their token is cancelled,
    /// so anything still registered is running
    fn status(&self) -> TaskStatus {
        TaskStatus::Running
    }

    fn snapshot(&self, key: &TaskKey) -> TaskSnapshot {
        let progress = self.progress.borrow();
        let status = self.status();
        TaskSnapshot {
            key: key.clone(),
            status,
            sent_count: progress.sent_count,
            is_running: status.is_running(),
            target_id: self.config.target_id.clone(),
            credential_count: self.config.credentials.len(),
            payload_count: self.config.payloads.len(),
            cycles: progress.cycles,
            last_error: progress.last_error.clone(),
            created_at: self.created_at,
        }
    }

    fn summary(&self, key: &TaskKey) -> TaskSummary {
        TaskSummary {
            key: key.clone(),
            status: self.status(),
            sent_count: self.progress.borrow().sent_count,
        }
    }
}

/// Concurrency-safe collection of live dispatch tasks
pub struct TaskRegistry {
    /// Live tasks by key
    tasks: Mutex<HashMap<TaskKey, TaskEntry>>,

    /// Outbound sender shared by every loop
    sender: Arc<dyn MessageSender>,

    /// Pacing applied to every loop
    pacing: PacingConfig,

    /// Parent of every task's cancellation token
    root: CancellationToken,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new(sender: Arc<dyn MessageSender>, pacing: PacingConfig) -> Self {
        debug!(?pacing, "TaskRegistry::new: called");
        Self {
            tasks: Mutex::new(HashMap::new()),
            sender,
            pacing,
            root: CancellationToken::new(),
        }
    }

    pub fn pacing(&self) -> PacingConfig {
        self.pacing
    }

    /// Validate a request, spawn its dispatch loop and register it
    pub async fn create(&self, request: CreateTaskRequest) -> Result<TaskKey, RegistryError> {
        debug!(
            credentials = request.credentials.len(),
            payloads = request.payloads.len(),
            target_id = %request.target_id,
            "TaskRegistry::create: called"
        );
        let config = Arc::new(TaskConfig::from_request(request).map_err(|reason| {
            debug!(%reason, "TaskRegistry::create: rejected");
            RegistryError::InvalidConfig(reason)
        })?);

        let mut tasks = self.tasks.lock().await;

        if self.root.is_cancelled() {
            debug!("TaskRegistry::create: registry shut down, rejecting");
            return Err(RegistryError::ShuttingDown);
        }

        let key = loop {
            let candidate = generate_key();
            if !tasks.contains_key(&candidate) {
                break candidate;
            }
            debug!(%candidate, "TaskRegistry::create: key collision, regenerating");
        };

        let cancel = self.root.child_token();
        let (dispatch, progress) = DispatchLoop::new(
            key.clone(),
            Arc::clone(&config),
            Arc::clone(&self.sender),
            self.pacing,
            cancel.clone(),
        );
        let mode = dispatch.mode();
        let join = tokio::spawn(dispatch.run());

        info!(
            %key,
            ?mode,
            target_id = %config.target_id,
            credentials = config.credentials.len(),
            payloads = config.payloads.len(),
            delay = ?config.delay,
            "Task created"
        );

        tasks.insert(
            key.clone(),
            TaskEntry {
                config,
                cancel,
                progress,
                join,
                created_at: Utc::now(),
            },
        );
        debug!(%key, registered = tasks.len(), "TaskRegistry::create: complete");
        Ok(key)
    }

    /// Signal a task to stop and drop it from the registry
    ///
    /// Does not wait for the loop to exit; it winds down on its own at its
    /// next check point.
    pub async fn stop(&self, key: &TaskKey) -> Result<(), RegistryError> {
        debug!(%key, "TaskRegistry::stop: called");
        let mut tasks = self.tasks.lock().await;
        let entry = tasks.remove(key).ok_or_else(|| {
            debug!(%key, "TaskRegistry::stop: not found");
            RegistryError::NotFound(key.to_string())
        })?;
        entry.cancel.cancel();
        drop(tasks);

        info!(%key, sent_count = entry.progress.borrow().sent_count, "Task stopped");
        Ok(())
    }

    /// Point-in-time view of one task
    pub async fn get(&self, key: &TaskKey) -> Result<TaskSnapshot, RegistryError> {
        debug!(%key, "TaskRegistry::get: called");
        let tasks = self.tasks.lock().await;
        tasks
            .get(key)
            .map(|entry| entry.snapshot(key))
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    /// Summaries of every registered task, ordered by key
    pub async fn list(&self) -> Vec<TaskSummary> {
        debug!("TaskRegistry::list: called");
        let tasks = self.tasks.lock().await;
        let mut summaries: Vec<TaskSummary> = tasks.iter().map(|(key, entry)| entry.summary(key)).collect();
        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        summaries
    }

    /// Stop every registered task; returns the keys that were stopped
    pub async fn stop_all(&self) -> Vec<TaskKey> {
        debug!("TaskRegistry::stop_all: called");
        let mut tasks = self.tasks.lock().await;
        let mut keys: Vec<TaskKey> = tasks
            .drain()
            .map(|(key, entry)| {
                entry.cancel.cancel();
                key
            })
            .collect();
        drop(tasks);

        keys.sort();
        info!(count = keys.len(), "Stopped all tasks");
        keys
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    /// Stop everything and wait for the loops to exit
    ///
    /// Loops still running after `timeout` are aborted. Returns how many had
    /// to be aborted. Later `create` calls fail with `ShuttingDown`.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        debug!(?timeout, "TaskRegistry::shutdown: called");
        let mut tasks = self.tasks.lock().await;
        self.root.cancel();
        let entries: Vec<(TaskKey, TaskEntry)> = tasks.drain().collect();
        drop(tasks);

        info!("Shutting down registry with {} active tasks", entries.len());

        let deadline = tokio::time::Instant::now() + timeout;
        let mut aborted = 0;
        for (key, mut entry) in entries {
            match tokio::time::timeout_at(deadline, &mut entry.join).await {
                Ok(Ok(exit)) => {
                    debug!(%key, sent_count = exit.sent_count, "shutdown: loop exited");
                }
                Ok(Err(e)) => {
                    warn!(%key, error = %e, "shutdown: loop task failed");
                }
                Err(_) => {
                    warn!(%key, "shutdown: loop did not exit in time, aborting");
                    entry.join.abort();
                    aborted += 1;
                }
            }
        }

        info!(aborted, "Registry shutdown complete");
        aborted
    }
}
