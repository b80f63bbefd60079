// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration.
//!
//! Loaded from a RON file passed on the command line; every field is
//! optional and falls back to its default.

use serde::{Deserialize, Serialize};
use stagecue_recorder::AutoRecordConfig;
use stagecue_timeline::EngineConfig;
use std::path::Path;

use crate::player::PlayerError;

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// Auto-record settings
    pub recording: AutoRecordConfig,
    /// Tick rate of the frame clock
    pub frame_rate: f64,
    /// Visible countdown before playback starts (seconds)
    pub preroll_seconds: u32,
    /// Simulated latency of the recorder's start (ms)
    pub recorder_latency_ms: u64,
    /// Simulate the user ending the capture after this much playback (ms)
    pub revoke_capture_after_ms: Option<f64>,
    /// Hard limit on processed ticks
    pub max_ticks: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            recording: AutoRecordConfig::default(),
            frame_rate: 60.0,
            preroll_seconds: 3,
            recorder_latency_ms: 150,
            revoke_capture_after_ms: None,
            max_ticks: 60 * 60 * 10,
        }
    }
}

impl PlayerConfig {
    /// Parse a RON document
    pub fn from_ron_str(source: &str) -> Result<Self, PlayerError> {
        Ok(ron::from_str(source)?)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self, PlayerError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }
}
