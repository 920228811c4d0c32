//! DispatchLoop - drives one task's sends until it is cancelled
//!
//! The loop exclusively owns its rotation cursors and attempt counter and
//! publishes a [`DispatchProgress`] copy over a `watch` channel after every
//! attempt. Every pause races the task's [`CancellationToken`], so a stop
//! request is observed at the next check point rather than after a full
//! quiet period.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PacingConfig;
use crate::domain::{DispatchProgress, TaskConfig, TaskKey};
use crate::sender::{MessageSender, SendError};

use super::format::format_payload;
use super::rotation::Rotation;

/// How a loop walks its credentials, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// One credential: full passes over the payload list
    Single,
    /// Several credentials: one send per step, credentials and payloads
    /// rotating independently
    RoundRobin,
}

impl DispatchMode {
    pub fn for_credentials(count: usize) -> Self {
        if count > 1 { Self::RoundRobin } else { Self::Single }
    }
}

/// Whether the loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stopped,
}

/// Final counters of a loop that observed its stop signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchExit {
    pub key: TaskKey,
    pub sent_count: u64,
    pub cycles: u64,
}

/// Dispatch loop for one task
pub struct DispatchLoop {
    key: TaskKey,
    config: Arc<TaskConfig>,
    sender: Arc<dyn MessageSender>,
    pacing: PacingConfig,
    mode: DispatchMode,
    rotation: Rotation,
    progress: DispatchProgress,
    progress_tx: watch::Sender<DispatchProgress>,
    cancel: CancellationToken,
}

impl DispatchLoop {
    /// Create a loop and the receiver its progress is published on
    pub fn new(
        key: TaskKey,
        config: Arc<TaskConfig>,
        sender: Arc<dyn MessageSender>,
        pacing: PacingConfig,
        cancel: CancellationToken,
    ) -> (Self, watch::Receiver<DispatchProgress>) {
        let mode = DispatchMode::for_credentials(config.credentials.len());
        debug!(%key, ?mode, credentials = config.credentials.len(), payloads = config.payloads.len(), "DispatchLoop::new: called");
        let (progress_tx, progress_rx) = watch::channel(DispatchProgress::default());
        let rotation = Rotation::new(config.credentials.len(), config.payloads.len());

        let dispatch = Self {
            key,
            config,
            sender,
            pacing,
            mode,
            rotation,
            progress: DispatchProgress::default(),
            progress_tx,
            cancel,
        };
        (dispatch, progress_rx)
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Run until the cancellation token fires
    ///
    /// A panic inside a step is caught and logged, followed by the error
    /// cooldown; the loop never ends on its own.
    pub async fn run(mut self) -> DispatchExit {
        info!(
            key = %self.key,
            mode = ?self.mode,
            target_id = %self.config.target_id,
            "Dispatch loop started"
        );

        loop {
            if self.cancel.is_cancelled() {
                debug!(key = %self.key, "run: cancellation observed");
                break;
            }

            let step = match self.mode {
                DispatchMode::Single => AssertUnwindSafe(self.run_pass()).catch_unwind().await,
                DispatchMode::RoundRobin => AssertUnwindSafe(self.run_step()).catch_unwind().await,
            };

            match step {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stopped) => break,
                Err(panic) => {
                    error!(
                        key = %self.key,
                        error = %panic_message(panic.as_ref()),
                        cooldown = ?self.pacing.error_cooldown,
                        "Unexpected dispatch error, cooling down"
                    );
                    if self.pause(self.pacing.error_cooldown).await == Flow::Stopped {
                        break;
                    }
                }
            }
        }

        info!(
            key = %self.key,
            sent_count = self.progress.sent_count,
            cycles = self.progress.cycles,
            "Dispatch loop stopped"
        );
        DispatchExit {
            key: self.key,
            sent_count: self.progress.sent_count,
            cycles: self.progress.cycles,
        }
    }

    /// Single-credential mode: finish the current pass over the payloads, then
    /// hold the quiet period
    async fn run_pass(&mut self) -> Flow {
        debug!(key = %self.key, from = self.rotation.payload_cursor(), "run_pass: called");
        loop {
            if self.cancel.is_cancelled() {
                return Flow::Stopped;
            }

            let (credential_idx, payload_idx) = self.rotation.current();
            self.attempt(credential_idx, payload_idx).await;
            let wrapped = self.advance();

            if self.pause(self.config.delay).await == Flow::Stopped {
                return Flow::Stopped;
            }
            if wrapped {
                break;
            }
        }

        debug!(key = %self.key, quiet_period = ?self.pacing.quiet_period, "run_pass: pass complete, entering quiet period");
        self.pause(self.pacing.quiet_period).await
    }

    /// Multi-credential mode: one send, then the delay, plus the quiet period
    /// whenever the payload cursor wraps
    async fn run_step(&mut self) -> Flow {
        if self.cancel.is_cancelled() {
            return Flow::Stopped;
        }

        let (credential_idx, payload_idx) = self.rotation.current();
        self.attempt(credential_idx, payload_idx).await;
        let wrapped = self.advance();

        if self.pause(self.config.delay).await == Flow::Stopped {
            return Flow::Stopped;
        }
        if wrapped {
            debug!(key = %self.key, quiet_period = ?self.pacing.quiet_period, "run_step: cycle complete, entering quiet period");
            return self.pause(self.pacing.quiet_period).await;
        }
        Flow::Continue
    }

    /// Perform one send; success or failure, it counts as one attempt
    async fn attempt(&mut self, credential_idx: usize, payload_idx: usize) {
        let config = Arc::clone(&self.config);
        let credential = &config.credentials[credential_idx];
        let text = format_payload(
            &config.decorator_prefix,
            &config.payloads[payload_idx],
            &config.decorator_suffix,
        );

        let outcome = tokio::time::timeout(
            self.pacing.send_timeout,
            self.sender.send_text(credential, &config.target_id, &text),
        )
        .await
        .unwrap_or(Err(SendError::Timeout(self.pacing.send_timeout)));

        self.progress.sent_count += 1;

        match outcome {
            Ok(()) => {
                info!(
                    key = %self.key,
                    message_number = payload_idx + 1,
                    credential_number = credential_idx + 1,
                    target_id = %config.target_id,
                    sent_count = self.progress.sent_count,
                    "Message sent"
                );
            }
            Err(e) => {
                warn!(
                    key = %self.key,
                    message_number = payload_idx + 1,
                    credential_number = credential_idx + 1,
                    rate_limited = e.is_rate_limit(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "Send failed"
                );
                self.progress.last_error = Some(e.to_string());
            }
        }
    }

    /// Advance the cursors and publish progress; returns true on a cycle wrap
    fn advance(&mut self) -> bool {
        let wrapped = self.rotation.advance();
        if wrapped {
            self.progress.cycles += 1;
        }
        self.progress.credential_cursor = self.rotation.credential_cursor();
        self.progress.payload_cursor = self.rotation.payload_cursor();
        self.progress_tx.send_replace(self.progress.clone());
        wrapped
    }

    /// Sleep unless cancelled first
    async fn pause(&self, duration: Duration) -> Flow {
        if self.cancel.is_cancelled() {
            return Flow::Stopped;
        }
        if duration.is_zero() {
            return Flow::Continue;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Flow::Stopped,
            _ = tokio::time::sleep(duration) => Flow::Continue,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
