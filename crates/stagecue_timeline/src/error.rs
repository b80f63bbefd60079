// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the timeline engine.

use crate::model::{ActionId, ActionKind, SceneId};

/// Result alias used throughout the timeline crate
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Errors raised while configuring the engine or installing a timeline
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// An action uses a kind no executor is registered for
    #[error("No executor registered for action kind `{kind}` (action {action})")]
    UnregisteredKind {
        /// The offending kind
        kind: ActionKind,
        /// The first action using it
        action: ActionId,
    },

    /// An action window extends past the end of its scene
    #[error("Action {action} ends at {end}ms, past the {scene_duration}ms of scene {scene}")]
    ActionOutOfBounds {
        /// Owning scene
        scene: SceneId,
        /// Offending action
        action: ActionId,
        /// `start_time + duration` of the action
        end: f64,
        /// Duration of the owning scene
        scene_duration: f64,
    },

    /// Configuration could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a single executor call.
///
/// These never abort playback; the dispatcher logs them and carries on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutorError {
    /// The executor returned an error
    #[error("Executor failed: {0}")]
    Failed(String),

    /// The executor panicked
    #[error("Executor panicked: {0}")]
    Panicked(String),
}

impl ExecutorError {
    /// Convenience constructor for [`ExecutorError::Failed`]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
