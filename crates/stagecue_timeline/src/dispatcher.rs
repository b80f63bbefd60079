// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-tick selection and execution of active actions.

use crate::context::ExecutionContext;
use crate::easing;
use crate::error::ExecutorError;
use crate::executor::ExecutorRegistry;
use crate::model::{Action, ActionId, Scene};
use std::panic::{self, AssertUnwindSafe};

/// Progress of an action at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionProgress {
    /// Linear progress in `[0, 1]`
    pub raw: f64,
    /// Progress after the action's easing curve
    pub eased: f64,
}

/// Compute the progress of `action` at `time`, or `None` when it is inactive
pub fn action_progress(action: &Action, time: f64) -> Option<ActionProgress> {
    if !action.is_active_at(time) {
        return None;
    }
    let raw = action.raw_progress(time);
    Some(ActionProgress {
        raw,
        eased: easing::ease(&action.easing, raw),
    })
}

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Actions that were active, with the eased progress they were given
    pub executed: Vec<(ActionId, f64)>,
    /// Executor calls that failed
    pub failures: Vec<(ActionId, ExecutorError)>,
}

impl DispatchReport {
    /// Eased progress handed to `action`, if it ran
    pub fn progress_of(&self, action: ActionId) -> Option<f64> {
        self.executed
            .iter()
            .find(|(id, _)| *id == action)
            .map(|(_, progress)| *progress)
    }

    /// Whether every executor call succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the executors of every active action in a scene
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: ExecutorRegistry,
}

impl Dispatcher {
    /// Create a dispatcher over a registry
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self { registry }
    }

    /// Get the executor registry
    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    /// Get the mutable executor registry
    pub fn registry_mut(&mut self) -> &mut ExecutorRegistry {
        &mut self.registry
    }

    /// Execute every action of `scene` active at `time`.
    ///
    /// Each executor call is isolated: an error or panic is logged and
    /// recorded, and the remaining actions still run.
    pub fn dispatch(&mut self, scene: &Scene, time: f64, context: &ExecutionContext) -> DispatchReport {
        let mut report = DispatchReport::default();

        for action in &scene.actions {
            let Some(progress) = action_progress(action, time) else {
                continue;
            };
            report.executed.push((action.id, progress.eased));

            let Some(executor) = self.registry.get_mut(&action.kind) else {
                // Timelines are validated when installed, so this only happens
                // if the registry was changed afterwards.
                tracing::warn!("No executor for {} action {}", action.kind, action.id);
                continue;
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                executor.execute(action, progress.eased, context)
            }));

            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => ExecutorError::Panicked(panic_message(payload.as_ref())),
            };
            tracing::warn!("{} action {} failed: {}", action.kind, action.id, error);
            report.failures.push((action.id, error));
        }

        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
