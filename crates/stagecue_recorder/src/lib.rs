// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recording control for `StageCue`.
//!
//! This crate keeps an external recorder in step with timeline playback:
//! - [`RecordingController`] contract for host recorders
//! - [`AutoRecordCoordinator`] state machine driven by playback status
//! - [`Countdown`] timer for delaying starts
//!
//! The coordinator only reads the engine's `{is_playing, is_paused}` pair; it
//! never reaches into scheduler internals.

pub mod controller;
pub mod coordinator;
pub mod countdown;
pub mod error;

pub use controller::{RecordingController, RecordingState, StartFuture};
pub use coordinator::{AutoRecordConfig, AutoRecordCoordinator, RecorderCommand, StartGuard};
pub use countdown::{Countdown, CountdownStatus};
pub use error::RecordingError;
