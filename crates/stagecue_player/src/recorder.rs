// SPDX-License-Identifier: MIT OR Apache-2.0
//! Simulated screen recorder.
//!
//! Stands in for a real capture backend: `start` resolves after a configurable
//! latency, and the capture can be "revoked" the way a user ends screen
//! sharing from the OS.

use futures::FutureExt;
use parking_lot::RwLock;
use stagecue_recorder::{RecordingController, RecordingState, StartFuture};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bookkeeping shared with in-flight start futures
#[derive(Debug, Default)]
struct Session {
    state: RecordingState,
    started_at: Option<Instant>,
    recorded: Duration,
}

/// Recorder that only logs what it would capture
#[derive(Debug)]
pub struct SimulatedRecorder {
    session: Arc<RwLock<Session>>,
    latency: Duration,
    revoked: AtomicBool,
}

impl SimulatedRecorder {
    /// Create a recorder whose start takes `latency`
    pub fn new(latency: Duration) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::default())),
            latency,
            revoked: AtomicBool::new(false),
        }
    }

    /// End the capture from outside, as if the user stopped sharing
    pub fn revoke(&self) {
        let mut session = self.session.write();
        if session.state == RecordingState::Recording || session.state == RecordingState::Paused {
            close_segment(&mut session);
            session.state = RecordingState::Stopped;
            self.revoked.store(true, Ordering::SeqCst);
            tracing::warn!("Capture revoked");
        }
    }

    /// Whether a revocation happened since the last call
    pub fn take_revocation(&self) -> bool {
        self.revoked.swap(false, Ordering::SeqCst)
    }

    /// Total captured time
    pub fn recorded(&self) -> Duration {
        let session = self.session.read();
        session.recorded + session.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }
}

impl RecordingController for SimulatedRecorder {
    fn state(&self) -> RecordingState {
        self.session.read().state
    }

    fn start(&self) -> StartFuture {
        let session = Arc::clone(&self.session);
        let latency = self.latency;
        async move {
            tokio::time::sleep(latency).await;
            let mut session = session.write();
            session.state = RecordingState::Recording;
            session.started_at = Some(Instant::now());
            session.recorded = Duration::ZERO;
            tracing::info!("Recorder: capturing");
            Ok(())
        }
        .boxed()
    }

    fn stop(&self) {
        let mut session = self.session.write();
        close_segment(&mut session);
        session.state = RecordingState::Stopped;
        tracing::info!("Recorder: stopped after {:.2}s", session.recorded.as_secs_f64());
    }

    fn supports_pause(&self) -> bool {
        true
    }

    fn pause(&self) {
        let mut session = self.session.write();
        close_segment(&mut session);
        session.state = RecordingState::Paused;
        tracing::info!("Recorder: paused");
    }

    fn resume(&self) {
        let mut session = self.session.write();
        session.started_at = Some(Instant::now());
        session.state = RecordingState::Recording;
        tracing::info!("Recorder: resumed");
    }
}

fn close_segment(session: &mut Session) {
    if let Some(started_at) = session.started_at.take() {
        session.recorded += started_at.elapsed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_resolves_to_recording() {
        let recorder = SimulatedRecorder::new(Duration::from_millis(1));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        assert_eq!(recorder.state(), RecordingState::Idle);
        runtime.block_on(recorder.start()).unwrap();
        assert_eq!(recorder.state(), RecordingState::Recording);

        recorder.pause();
        assert_eq!(recorder.state(), RecordingState::Paused);
        recorder.resume();
        recorder.stop();
        assert_eq!(recorder.state(), RecordingState::Stopped);
    }

    #[test]
    fn test_revocation_is_reported_once() {
        let recorder = SimulatedRecorder::new(Duration::ZERO);
        recorder.revoke();
        assert!(!recorder.take_revocation());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(recorder.start()).unwrap();
        recorder.revoke();
        assert_eq!(recorder.state(), RecordingState::Stopped);
        assert!(recorder.take_revocation());
        assert!(!recorder.take_revocation());
    }
}
