// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline, scene and action definitions.
//!
//! These are plain data. Times are milliseconds relative to the start of the
//! owning scene. Nothing here mutates in place on behalf of playback; helpers
//! that adjust content return new values.

use crate::easing;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    /// Create a new random action ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    /// Create a new random scene ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What an action does on the host canvas.
///
/// The engine never interprets the kind itself; it only routes the action to
/// the executor registered for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Draw a new element onto the canvas
    Draw,
    /// Move an existing element
    Move,
    /// Change element properties (color, opacity, size)
    Transform,
    /// Remove an element
    Erase,
    /// Type text into the canvas
    Text,
    /// Pan the viewport
    Pan,
    /// Zoom the viewport
    Zoom,
    /// Emphasize an element
    Highlight,
    /// Play narration or sound
    Audio,
    /// Host-specific kind
    Custom(String),
}

impl ActionKind {
    /// Get the display name
    pub fn name(&self) -> &str {
        match self {
            Self::Draw => "draw",
            Self::Move => "move",
            Self::Transform => "transform",
            Self::Erase => "erase",
            Self::Text => "text",
            Self::Pan => "pan",
            Self::Zoom => "zoom",
            Self::Highlight => "highlight",
            Self::Audio => "audio",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A time-addressed unit of scripted behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique action ID
    pub id: ActionId,
    /// What the action does
    pub kind: ActionKind,
    /// Start time within the scene (ms)
    pub start_time: f64,
    /// Duration (ms)
    pub duration: f64,
    /// Easing curve identifier
    #[serde(default = "default_easing")]
    pub easing: String,
    /// Opaque parameters forwarded to the executor
    #[serde(default)]
    pub params: serde_json::Value,
}

fn default_easing() -> String {
    easing::LINEAR.to_string()
}

impl Action {
    /// Create a new linear action
    pub fn new(kind: ActionKind, start_time: f64, duration: f64) -> Self {
        Self {
            id: ActionId::new(),
            kind,
            start_time: start_time.max(0.0),
            duration: duration.max(0.0),
            easing: default_easing(),
            params: serde_json::Value::Null,
        }
    }

    /// Set the easing curve
    pub fn with_easing(mut self, easing: impl Into<String>) -> Self {
        self.easing = easing.into();
        self
    }

    /// Set the executor parameters
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Time at which the action ends
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether `time` falls inside the action window (inclusive at both ends)
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time()
    }

    /// Linear progress through the action at `time`, clamped to `[0, 1]`.
    ///
    /// Zero-length actions are always complete.
    pub fn raw_progress(&self, time: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((time - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    /// Whether the action runs past the end of a scene of `scene_duration`
    pub fn exceeds(&self, scene_duration: f64) -> bool {
        self.end_time() > scene_duration
    }

    /// Copy of this action whose window fits inside `scene_duration`
    pub fn clamped_to(&self, scene_duration: f64) -> Self {
        let scene_duration = scene_duration.max(0.0);
        let start_time = self.start_time.clamp(0.0, scene_duration);
        let duration = self.duration.min(scene_duration - start_time).max(0.0);
        Self {
            start_time,
            duration,
            ..self.clone()
        }
    }
}

/// A bounded time window containing actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Unique scene ID
    pub id: SceneId,
    /// Scene name
    pub name: String,
    /// Total addressable time (ms)
    pub duration: f64,
    /// Actions in this scene
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            id: SceneId::new(),
            name: name.into(),
            duration: duration.max(0.0),
            actions: Vec::new(),
        }
    }

    /// Add an action (builder style)
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Actions whose window contains `time`
    pub fn active_actions(&self, time: f64) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(move |a| a.is_active_at(time))
    }

    /// Actions that run past the end of the scene
    pub fn out_of_bounds_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(move |a| a.exceeds(self.duration))
    }

    /// Copy of this scene with every action clamped to its duration
    pub fn clamped(&self) -> Self {
        Self {
            actions: self
                .actions
                .iter()
                .map(|a| a.clamped_to(self.duration))
                .collect(),
            ..self.clone()
        }
    }

    /// Look up an action by ID
    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }
}

/// Ordered collection of scenes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    scenes: Vec<Scene>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timeline from scenes
    pub fn from_scenes(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    /// Append a scene (builder style)
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }

    /// Get a scene by index
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Get all scenes
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    /// Get scene count
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the timeline has no scenes
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Sum of all scene durations
    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration).sum()
    }

    /// Iterate every action with the scene that owns it
    pub fn actions(&self) -> impl Iterator<Item = (&Scene, &Action)> {
        self.scenes
            .iter()
            .flat_map(|scene| scene.actions.iter().map(move |action| (scene, action)))
    }

    /// Copy of this timeline with every action clamped to its scene
    pub fn clamped(&self) -> Self {
        Self {
            scenes: self.scenes.iter().map(Scene::clamped).collect(),
        }
    }
}
