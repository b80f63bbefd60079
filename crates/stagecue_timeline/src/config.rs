// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! Configuration is stored as RON:
//!
//! ```text
//! (
//!     initial_speed: 1.0,
//!     looping: false,
//!     max_scene_advances_per_tick: None,
//!     action_bounds: Clamp,
//! )
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with actions that run past the end of their scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionBoundsPolicy {
    /// Leave the data alone; the action stops once its own window ends
    #[default]
    Allow,
    /// Shorten offending actions to fit their scene
    Clamp,
    /// Refuse the timeline
    Reject,
}

/// Settings applied when an engine is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting playback speed (clamped like any other speed)
    pub initial_speed: f64,
    /// Whether playback starts with looping enabled
    pub looping: bool,
    /// Cap on scene transitions per tick; `None` uses the scene count
    pub max_scene_advances_per_tick: Option<usize>,
    /// Handling of out-of-range actions in new timelines
    pub action_bounds: ActionBoundsPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_speed: 1.0,
            looping: false,
            max_scene_advances_per_tick: None,
            action_bounds: ActionBoundsPolicy::Allow,
        }
    }
}

impl EngineConfig {
    /// Parse a RON document
    pub fn from_ron_str(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }
}
