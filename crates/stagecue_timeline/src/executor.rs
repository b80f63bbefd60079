// SPDX-License-Identifier: MIT OR Apache-2.0
//! Executor contract and the registry mapping action kinds to executors.
//!
//! Executors are called on *every* tick while their action is active, with
//! non-decreasing progress. They must tolerate repeated calls and must not
//! assume any call is the first or the last one.

use crate::context::ExecutionContext;
use crate::error::{ExecutorError, Result, TimelineError};
use crate::model::{Action, ActionKind, Timeline};
use indexmap::IndexMap;

/// Host-supplied function that turns an action and its progress into an effect
pub trait ActionExecutor {
    /// Apply `action` at eased `progress` in `[0, 1]`
    fn execute(
        &mut self,
        action: &Action,
        progress: f64,
        context: &ExecutionContext,
    ) -> std::result::Result<(), ExecutorError>;
}

impl<F> ActionExecutor for F
where
    F: FnMut(&Action, f64, &ExecutionContext) -> std::result::Result<(), ExecutorError>,
{
    fn execute(
        &mut self,
        action: &Action,
        progress: f64,
        context: &ExecutionContext,
    ) -> std::result::Result<(), ExecutorError> {
        self(action, progress, context)
    }
}

/// Maps each [`ActionKind`] to the executor that handles it
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: IndexMap<ActionKind, Box<dyn ActionExecutor>>,
    fallback: Option<Box<dyn ActionExecutor>>,
}

impl ExecutorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor for a kind, replacing any previous one
    pub fn register(&mut self, kind: ActionKind, executor: impl ActionExecutor + 'static) {
        self.executors.insert(kind, Box::new(executor));
    }

    /// Register an executor (builder style)
    pub fn with(mut self, kind: ActionKind, executor: impl ActionExecutor + 'static) -> Self {
        self.register(kind, executor);
        self
    }

    /// Executor used for kinds without a dedicated one
    pub fn set_fallback(&mut self, executor: impl ActionExecutor + 'static) {
        self.fallback = Some(Box::new(executor));
    }

    /// Whether an action of `kind` can be executed
    pub fn handles(&self, kind: &ActionKind) -> bool {
        self.fallback.is_some() || self.executors.contains_key(kind)
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &ActionKind> {
        self.executors.keys()
    }

    /// Check that every action in `timeline` has an executor
    pub fn validate(&self, timeline: &Timeline) -> Result<()> {
        match timeline.actions().find(|(_, action)| !self.handles(&action.kind)) {
            Some((_, action)) => Err(TimelineError::UnregisteredKind {
                kind: action.kind.clone(),
                action: action.id,
            }),
            None => Ok(()),
        }
    }

    /// Get the executor for a kind
    pub fn get_mut(&mut self, kind: &ActionKind) -> Option<&mut (dyn ActionExecutor + 'static)> {
        match self.executors.get_mut(kind) {
            Some(executor) => Some(executor.as_mut()),
            None => self.fallback.as_deref_mut(),
        }
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("kinds", &self.executors.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scene;

    fn noop(_: &Action, _: f64, _: &ExecutionContext) -> std::result::Result<(), ExecutorError> {
        Ok(())
    }

    #[test]
    fn test_validation_rejects_unregistered_kind() {
        let registry = ExecutorRegistry::new().with(ActionKind::Draw, noop);
        let zoom = Action::new(ActionKind::Zoom, 0.0, 100.0);
        let zoom_id = zoom.id;
        let timeline = Timeline::new().with_scene(
            Scene::new("A", 1000.0)
                .with_action(Action::new(ActionKind::Draw, 0.0, 100.0))
                .with_action(zoom),
        );

        match registry.validate(&timeline) {
            Err(TimelineError::UnregisteredKind { kind, action }) => {
                assert_eq!(kind, ActionKind::Zoom);
                assert_eq!(action, zoom_id);
            }
            other => panic!("unexpected validation result: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_handles_everything() {
        let mut registry = ExecutorRegistry::new();
        assert!(!registry.handles(&ActionKind::Custom("sparkle".into())));

        registry.set_fallback(noop);
        assert!(registry.handles(&ActionKind::Custom("sparkle".into())));
        assert!(registry.get_mut(&ActionKind::Pan).is_some());
    }

    #[test]
    fn test_closures_are_executors() {
        let mut calls = Vec::new();
        {
            let mut registry = ExecutorRegistry::new();
            let (tx, rx) = std::sync::mpsc::channel();
            registry.register(ActionKind::Text, move |action: &Action, progress: f64, _: &ExecutionContext| {
                tx.send((action.id, progress)).map_err(|e| ExecutorError::failed(e.to_string()))
            });

            let action = Action::new(ActionKind::Text, 0.0, 10.0);
            let context = ExecutionContext::new();
            let executor = registry.get_mut(&ActionKind::Text).unwrap();
            executor.execute(&action, 0.5, &context).unwrap();
            calls.extend(rx.try_iter());
        }
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 0.5);
    }
}
