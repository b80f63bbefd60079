// SPDX-License-Identifier: MIT OR Apache-2.0
//! Contract for the external recording controller.

use crate::error::RecordingError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// State reported by the recording controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordingState {
    /// Nothing captured yet
    #[default]
    Idle,
    /// Capturing
    Recording,
    /// Capture paused
    Paused,
    /// Capture finished
    Stopped,
}

impl RecordingState {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Recording => "Recording",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }
}

/// Future returned by [`RecordingController::start`]
pub type StartFuture = BoxFuture<'static, Result<(), RecordingError>>;

/// Host-owned recorder (screen capture, media recorder, ...).
///
/// `start` may involve device or network latency, so it returns a future
/// that is awaited off the host thread. The other calls are expected to take
/// effect immediately.
pub trait RecordingController: Send + Sync {
    /// Current recorder state
    fn state(&self) -> RecordingState;

    /// Begin capturing
    fn start(&self) -> StartFuture;

    /// End capturing
    fn stop(&self);

    /// Whether [`pause`](Self::pause) and [`resume`](Self::resume) are available
    fn supports_pause(&self) -> bool {
        false
    }

    /// Pause capturing
    fn pause(&self) {}

    /// Resume capturing
    fn resume(&self) {}
}
