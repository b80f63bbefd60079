// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for recording control.

/// Errors reported by a recording controller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordingError {
    /// The controller refused to start (permission denied, user cancelled)
    #[error("Recording start rejected: {0}")]
    Rejected(String),

    /// The capture device or media is not available
    #[error("Recording device unavailable: {0}")]
    Unavailable(String),

    /// `start()` did not resolve in time
    #[error("Recording did not start within {0:?}")]
    TimedOut(std::time::Duration),

    /// The background worker that awaits `start()` is gone
    #[error("Recording worker is not running")]
    WorkerGone,
}
