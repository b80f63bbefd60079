// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in demo: a small whiteboard canvas, the executors that draw on it,
//! and a three-scene timeline exercising them.

use parking_lot::Mutex;
use serde_json::{json, Value};
use stagecue_timeline::{
    Action, ActionKind, ExecutionContext, ExecutorError, ExecutorRegistry, Scene, Timeline,
};
use std::collections::BTreeMap;

/// Context key the canvas is stored under
pub const CANVAS: &str = "canvas";

/// Eased progress at which a confetti burst counts as played
const CONFETTI_SETTLED: f64 = 0.99;

/// A drawn element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Position
    pub position: (f64, f64),
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Visible text
    pub text: String,
    /// Highlight strength in `[0, 1]`
    pub highlight: f64,
}

/// Viewport over the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Top-left corner
    pub offset: (f64, f64),
    /// Zoom factor
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: (0.0, 0.0),
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Default)]
struct CanvasState {
    elements: BTreeMap<String, Element>,
    viewport: Viewport,
    effects: Vec<String>,
}

/// Whiteboard the demo executors draw on
#[derive(Debug, Default)]
pub struct Canvas {
    state: Mutex<CanvasState>,
}

impl Canvas {
    /// Create an empty canvas
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of an element
    pub fn element(&self, name: &str) -> Option<Element> {
        self.state.lock().elements.get(name).cloned()
    }

    /// Get a copy of the viewport
    pub fn viewport(&self) -> Viewport {
        self.state.lock().viewport.clone()
    }

    /// Effects that played to completion
    pub fn effects(&self) -> Vec<String> {
        self.state.lock().effects.clone()
    }

    /// Number of elements
    pub fn element_count(&self) -> usize {
        self.state.lock().elements.len()
    }

    fn update(&self, name: &str, f: impl FnOnce(&mut Element)) {
        let mut state = self.state.lock();
        f(state.elements.entry(name.to_string()).or_default());
    }
}

fn canvas(context: &ExecutionContext) -> Result<&Canvas, ExecutorError> {
    context
        .get::<Canvas>(CANVAS)
        .ok_or_else(|| ExecutorError::failed("no canvas in execution context"))
}

fn string_param<'a>(action: &'a Action, key: &str) -> Result<&'a str, ExecutorError> {
    action
        .params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ExecutorError::failed(format!("{} action needs a `{key}` string", action.kind)))
}

fn number_param(action: &Action, key: &str) -> Result<f64, ExecutorError> {
    action
        .params
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ExecutorError::failed(format!("{} action needs a numeric `{key}`", action.kind)))
}

fn point_param(action: &Action, key: &str) -> Result<(f64, f64), ExecutorError> {
    let point = action.params.get(key).and_then(Value::as_array);
    match point.map(|p| p.as_slice()) {
        Some([x, y]) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(ExecutorError::failed(format!("`{key}` must hold two numbers"))),
        },
        _ => Err(ExecutorError::failed(format!(
            "{} action needs a `{key}` point",
            action.kind
        ))),
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

fn lerp_point(from: (f64, f64), to: (f64, f64), t: f64) -> (f64, f64) {
    (lerp(from.0, to.0, t), lerp(from.1, to.1, t))
}

/// Registry with an executor for every kind the demo timeline uses
pub fn registry() -> ExecutorRegistry {
    ExecutorRegistry::new()
        .with(ActionKind::Draw, |action: &Action, progress: f64, ctx: &ExecutionContext| -> Result<(), ExecutorError> {
            let name = string_param(action, "element")?;
            let at = point_param(action, "at")?;
            canvas(ctx)?.update(name, |element| {
                element.position = at;
                element.opacity = progress;
            });
            Ok(())
        })
        .with(ActionKind::Move, |action: &Action, progress: f64, ctx: &ExecutionContext| -> Result<(), ExecutorError> {
            let name = string_param(action, "element")?;
            let position = lerp_point(point_param(action, "from")?, point_param(action, "to")?, progress);
            canvas(ctx)?.update(name, |element| element.position = position);
            Ok(())
        })
        .with(ActionKind::Text, |action: &Action, progress: f64, ctx: &ExecutionContext| -> Result<(), ExecutorError> {
            let name = string_param(action, "element")?;
            let text = string_param(action, "text")?;
            let total = text.chars().count();
            // Typewriter: reveal characters as progress grows
            let visible = ((total as f64) * progress).round() as usize;
            let shown: String = text.chars().take(visible.min(total)).collect();
            canvas(ctx)?.update(name, |element| {
                element.text = shown;
                element.opacity = 1.0;
            });
            Ok(())
        })
        .with(ActionKind::Highlight, |action: &Action, progress: f64, ctx: &ExecutionContext| -> Result<(), ExecutorError> {
            let name = string_param(action, "element")?;
            // Pulse up then back down
            let strength = 1.0 - (2.0 * progress - 1.0).abs();
            canvas(ctx)?.update(name, |element| element.highlight = strength);
            Ok(())
        })
        .with(ActionKind::Zoom, |action: &Action, progress: f64, ctx: &ExecutionContext| -> Result<(), ExecutorError> {
            let zoom = lerp(number_param(action, "from")?, number_param(action, "to")?, progress);
            canvas(ctx)?.state.lock().viewport.zoom = zoom;
            Ok(())
        })
        .with(ActionKind::Pan, |action: &Action, progress: f64, ctx: &ExecutionContext| -> Result<(), ExecutorError> {
            let offset = lerp_point(point_param(action, "from")?, point_param(action, "to")?, progress);
            canvas(ctx)?.state.lock().viewport.offset = offset;
            Ok(())
        })
        .with(
            ActionKind::Custom("confetti".into()),
            |action: &Action, progress: f64, ctx: &ExecutionContext| -> Result<(), ExecutorError> {
                if progress >= CONFETTI_SETTLED {
                    let mut state = canvas(ctx)?.state.lock();
                    if !state.effects.iter().any(|e| e == "confetti") {
                        tracing::info!("Confetti! ({})", action.id);
                        state.effects.push("confetti".into());
                    }
                }
                Ok(())
            },
        )
}

/// Three-scene walkthrough
pub fn timeline() -> Timeline {
    Timeline::new()
        .with_scene(
            Scene::new("Title", 2000.0)
                .with_action(
                    Action::new(ActionKind::Draw, 0.0, 500.0)
                        .with_easing("easeOutCubic")
                        .with_params(json!({ "element": "title", "at": [320.0, 80.0] })),
                )
                .with_action(
                    Action::new(ActionKind::Text, 300.0, 1000.0)
                        .with_params(json!({ "element": "title", "text": "StageCue" })),
                )
                .with_action(
                    Action::new(ActionKind::Highlight, 1400.0, 500.0)
                        .with_easing("easeInOutSine")
                        .with_params(json!({ "element": "title" })),
                ),
        )
        .with_scene(
            Scene::new("Diagram", 3000.0)
                .with_action(
                    Action::new(ActionKind::Draw, 0.0, 400.0)
                        .with_params(json!({ "element": "box", "at": [100.0, 100.0] })),
                )
                .with_action(
                    Action::new(ActionKind::Move, 500.0, 1000.0)
                        .with_easing("easeInOutQuad")
                        .with_params(json!({
                            "element": "box",
                            "from": [100.0, 100.0],
                            "to": [400.0, 200.0],
                        })),
                )
                .with_action(
                    Action::new(ActionKind::Zoom, 1500.0, 1000.0)
                        .with_easing("easeInOutCubic")
                        .with_params(json!({ "from": 1.0, "to": 1.5 })),
                )
                .with_action(
                    Action::new(ActionKind::Pan, 2000.0, 800.0)
                        .with_easing("easeOutQuart")
                        .with_params(json!({ "from": [0.0, 0.0], "to": [120.0, 40.0] })),
                ),
        )
        .with_scene(
            Scene::new("Outro", 1500.0)
                .with_action(
                    Action::new(ActionKind::Text, 0.0, 600.0)
                        .with_params(json!({ "element": "thanks", "text": "Thanks for watching" })),
                )
                .with_action(
                    Action::new(ActionKind::Custom("confetti".into()), 400.0, 1000.0)
                        .with_easing("easeOutBounce"),
                ),
        )
}
