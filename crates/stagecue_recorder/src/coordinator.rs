// SPDX-License-Identifier: MIT OR Apache-2.0
//! Auto-record coordinator.
//!
//! Watches the playback `{is_playing, is_paused}` pair and keeps a
//! [`RecordingController`] in step with it, so the captured media brackets
//! the scripted playback. Rules, first match wins:
//!
//! 1. Running, recorder idle, no start outstanding: start recording
//!    (optionally after a countdown).
//! 2. Paused while recording: pause the recorder, if it can.
//! 3. Running while the recorder is paused: resume it, if it can.
//! 4. Stopped after a start, recorder not idle: stop the recorder.
//! 5. Recorder idle or stopped: forget the previous start.
//!
//! `start()` is asynchronous. Its future is awaited on a worker thread and
//! the outcome comes back over a channel, so the host thread never waits.

use crate::controller::{RecordingController, RecordingState, StartFuture};
use crate::countdown::{Countdown, CountdownStatus};
use crate::error::RecordingError;
use serde::{Deserialize, Serialize};
use stagecue_timeline::PlaybackStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Coordinator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRecordConfig {
    /// Whether playback drives the recorder at all
    pub enabled: bool,
    /// Seconds to count down before starting the recorder
    pub countdown_seconds: u32,
    /// How long a `start()` may take before it counts as failed (ms)
    pub start_timeout_ms: u64,
}

impl Default for AutoRecordConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            countdown_seconds: 0,
            start_timeout_ms: 10_000,
        }
    }
}

/// Re-entrancy guard around `start()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartGuard {
    /// No start issued for the current run
    #[default]
    Clear,
    /// Waiting for the countdown before starting
    CountingDown,
    /// `start()` was called and has not resolved
    InFlight,
    /// `start()` resolved successfully
    Started,
}

/// Call the coordinator made on the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    /// Countdown before start began
    CountdownArmed,
    /// `start()` issued
    Start,
    /// `pause()` issued
    Pause,
    /// `resume()` issued
    Resume,
    /// `stop()` issued
    Stop,
}

struct StartRequest {
    attempt: u64,
    future: StartFuture,
}

struct StartOutcome {
    attempt: u64,
    result: Result<(), RecordingError>,
}

/// State machine synchronizing a recorder with playback
pub struct AutoRecordCoordinator {
    controller: Arc<dyn RecordingController>,
    config: AutoRecordConfig,
    guard: StartGuard,
    /// Incremented for every `start()`; stale outcomes are ignored
    attempt: u64,
    countdown: Countdown,
    last_observed: Option<(PlaybackStatus, RecordingState)>,
    last_status: PlaybackStatus,
    request_tx: mpsc::UnboundedSender<StartRequest>,
    outcome_rx: mpsc::UnboundedReceiver<StartOutcome>,
}

impl AutoRecordCoordinator {
    /// Create a coordinator and its start worker
    pub fn new(controller: Arc<dyn RecordingController>, config: AutoRecordConfig) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let start_timeout = Duration::from_millis(config.start_timeout_ms);

        // Spawn the worker that awaits start futures
        if let Err(e) = std::thread::Builder::new()
            .name("stagecue-recorder".into())
            .spawn(move || start_worker(request_rx, outcome_tx, start_timeout))
        {
            tracing::error!("Failed to spawn recorder worker: {}", e);
        }

        Self {
            controller,
            countdown: Countdown::new(config.countdown_seconds),
            config,
            guard: StartGuard::Clear,
            attempt: 0,
            last_observed: None,
            last_status: PlaybackStatus::default(),
            request_tx,
            outcome_rx,
        }
    }

    /// Feed the current playback status.
    ///
    /// Rules are only evaluated when the status or the recorder state changed
    /// since the previous call, so this is cheap to call on every tick.
    pub fn observe(&mut self, status: PlaybackStatus) -> Option<RecorderCommand> {
        self.poll_outcomes();
        if !self.config.enabled {
            return None;
        }

        let recording = self.controller.state();
        if self.last_observed == Some((status, recording)) {
            return None;
        }
        self.last_observed = Some((status, recording));
        self.evaluate(status, recording)
    }

    /// Evaluate the rules for an explicit status and recorder state
    pub fn evaluate(&mut self, status: PlaybackStatus, recording: RecordingState) -> Option<RecorderCommand> {
        self.last_status = status;

        if self.guard == StartGuard::CountingDown && !status.is_running() {
            tracing::debug!("Playback left running state; countdown cancelled");
            self.countdown.set_active(false);
            self.guard = StartGuard::Clear;
        }

        if status.is_running() && recording == RecordingState::Idle && self.guard == StartGuard::Clear {
            return Some(self.arm_or_start());
        }

        if status.is_paused && recording == RecordingState::Recording && self.controller.supports_pause() {
            tracing::info!("Pausing recording");
            self.controller.pause();
            return Some(RecorderCommand::Pause);
        }

        if status.is_running() && recording == RecordingState::Paused && self.controller.supports_pause() {
            tracing::info!("Resuming recording");
            self.controller.resume();
            return Some(RecorderCommand::Resume);
        }

        if status.is_stopped() && self.guard != StartGuard::Clear && recording != RecordingState::Idle {
            tracing::info!("Stopping recording");
            self.controller.stop();
            self.guard = StartGuard::Clear;
            return Some(RecorderCommand::Stop);
        }

        // An outstanding start or countdown resolves through its own path
        if matches!(recording, RecordingState::Idle | RecordingState::Stopped)
            && self.guard == StartGuard::Started
        {
            self.guard = StartGuard::Clear;
        }

        None
    }

    /// Advance the start countdown by `elapsed` wall-clock time
    pub fn update(&mut self, elapsed: Duration) -> Option<RecorderCommand> {
        self.poll_outcomes();
        if self.guard != StartGuard::CountingDown {
            return None;
        }

        match self.countdown.advance(elapsed) {
            CountdownStatus::Completed | CountdownStatus::Elapsed => {
                self.countdown.set_active(false);
                if self.last_status.is_running() && self.controller.state() == RecordingState::Idle {
                    self.begin_start();
                    Some(RecorderCommand::Start)
                } else {
                    self.guard = StartGuard::Clear;
                    None
                }
            }
            CountdownStatus::Counting { .. } | CountdownStatus::Inactive => None,
        }
    }

    /// Apply every start outcome the worker has reported
    pub fn poll_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    /// Block until an outstanding `start()` resolves and apply the outcome.
    ///
    /// Returns `false` if no start was outstanding. Must not be called from
    /// inside an async runtime.
    pub fn wait_for_start(&mut self) -> bool {
        if self.guard != StartGuard::InFlight {
            return false;
        }
        match self.outcome_rx.blocking_recv() {
            Some(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            None => {
                tracing::warn!("Recorder worker exited with a start outstanding");
                self.guard = StartGuard::Clear;
                false
            }
        }
    }

    /// Get the start guard
    pub fn guard(&self) -> StartGuard {
        self.guard
    }

    /// Seconds left before the recorder starts, while counting down
    pub fn countdown_remaining(&self) -> Option<u32> {
        (self.guard == StartGuard::CountingDown).then(|| self.countdown.remaining())
    }

    /// Get the recording controller
    pub fn controller(&self) -> &Arc<dyn RecordingController> {
        &self.controller
    }

    /// Get the configuration
    pub fn config(&self) -> &AutoRecordConfig {
        &self.config
    }

    fn arm_or_start(&mut self) -> RecorderCommand {
        if self.config.countdown_seconds > 0 {
            tracing::info!("Recording starts in {}s", self.config.countdown_seconds);
            self.guard = StartGuard::CountingDown;
            self.countdown.set_active(true);
            RecorderCommand::CountdownArmed
        } else {
            self.begin_start();
            RecorderCommand::Start
        }
    }

    fn begin_start(&mut self) {
        // The guard goes up before the call so nothing can slip in twice
        self.guard = StartGuard::InFlight;
        self.attempt += 1;
        tracing::info!("Starting recording (attempt {})", self.attempt);

        let request = StartRequest {
            attempt: self.attempt,
            future: self.controller.start(),
        };
        if self.request_tx.send(request).is_err() {
            tracing::warn!("{}", RecordingError::WorkerGone);
            self.guard = StartGuard::Clear;
        }
    }

    fn apply_outcome(&mut self, outcome: StartOutcome) {
        if outcome.attempt != self.attempt || self.guard != StartGuard::InFlight {
            tracing::debug!("Ignoring stale start outcome (attempt {})", outcome.attempt);
            return;
        }

        match outcome.result {
            Ok(()) => {
                tracing::info!("Recording started");
                self.guard = StartGuard::Started;
                if self.last_status.is_stopped() {
                    tracing::info!("Playback stopped while recording was starting; stopping it");
                    self.controller.stop();
                    self.guard = StartGuard::Clear;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to start recording: {}", e);
                self.guard = StartGuard::Clear;
            }
        }
    }
}

impl std::fmt::Debug for AutoRecordCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoRecordCoordinator")
            .field("config", &self.config)
            .field("guard", &self.guard)
            .field("attempt", &self.attempt)
            .field("countdown", &self.countdown)
            .finish_non_exhaustive()
    }
}

/// Worker thread awaiting start futures one at a time
fn start_worker(
    mut request_rx: mpsc::UnboundedReceiver<StartRequest>,
    outcome_tx: mpsc::UnboundedSender<StartOutcome>,
    start_timeout: Duration,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create recorder runtime: {}", e);
            return;
        }
    };

    runtime.block_on(async {
        while let Some(request) = request_rx.recv().await {
            let result = match tokio::time::timeout(start_timeout, request.future).await {
                Ok(result) => result,
                Err(_) => Err(RecordingError::TimedOut(start_timeout)),
            };
            let outcome = StartOutcome {
                attempt: request.attempt,
                result,
            };
            if outcome_tx.send(outcome).is_err() {
                break; // Coordinator dropped
            }
        }
    });
}
