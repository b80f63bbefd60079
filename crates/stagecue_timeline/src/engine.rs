// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine facade: the control and read surface hosts talk to.
//!
//! An [`Engine`] owns one [`Scheduler`], the [`Dispatcher`] with its executor
//! registry, and the execution context. All calls, ticks included, must be
//! serialized by the host; the engine takes no locks.

use crate::config::{ActionBoundsPolicy, EngineConfig};
use crate::context::ExecutionContext;
use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::error::{Result, TimelineError};
use crate::executor::{ActionExecutor, ExecutorRegistry};
use crate::model::{ActionId, ActionKind, Scene, Timeline};
use crate::scheduler::{PlaybackEvent, PlaybackState, PlaybackStatus, Scheduler, TickOutcome};
use crate::tick::TickSource;

/// What a call to [`Engine::tick`] did
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    /// Playback was not running
    Ignored,
    /// The current scene changed; nothing was dispatched
    Transitioned {
        /// Scene current after the tick
        scene_index: usize,
    },
    /// The timeline ended and playback stopped
    Finished,
    /// Active actions were executed
    Dispatched {
        /// Current scene
        scene_index: usize,
        /// Time within the scene
        time: f64,
        /// Per-action results
        report: DispatchReport,
    },
}

/// Timeline playback engine
#[derive(Debug)]
pub struct Engine {
    scheduler: Scheduler,
    dispatcher: Dispatcher,
    context: ExecutionContext,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with default configuration
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    /// Create an engine with explicit configuration
    pub fn with_config(registry: ExecutorRegistry, config: EngineConfig) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.set_speed(config.initial_speed);
        scheduler.set_looping(config.looping);
        scheduler.set_max_advances_per_tick(config.max_scene_advances_per_tick);
        // Construction is not a host-visible transition
        scheduler.take_events();

        Self {
            scheduler,
            dispatcher: Dispatcher::new(registry),
            context: ExecutionContext::new(),
            config,
        }
    }

    /// Register an executor for a kind
    pub fn register_executor(&mut self, kind: ActionKind, executor: impl ActionExecutor + 'static) {
        self.dispatcher.registry_mut().register(kind, executor);
    }

    /// Install a timeline, resetting playback to idle at the first scene.
    ///
    /// Fails without touching the current timeline if an action has no
    /// executor, or if it runs past its scene under
    /// [`ActionBoundsPolicy::Reject`].
    pub fn set_timeline(&mut self, timeline: Timeline) -> Result<()> {
        let timeline = match self.config.action_bounds {
            ActionBoundsPolicy::Allow => timeline,
            ActionBoundsPolicy::Clamp => timeline.clamped(),
            ActionBoundsPolicy::Reject => {
                reject_out_of_bounds(&timeline)?;
                timeline
            }
        };
        self.dispatcher.registry().validate(&timeline)?;
        self.scheduler.set_timeline(timeline);
        Ok(())
    }

    /// Start or continue playback
    pub fn play(&mut self) {
        self.scheduler.play();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    /// Resume paused playback
    pub fn resume(&mut self) {
        self.scheduler.resume();
    }

    /// Stop and rewind. No executor runs for ticks arriving afterwards.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Jump to `time_ms` within the current scene
    pub fn seek_to(&mut self, time_ms: f64) {
        self.scheduler.seek_to(time_ms);
    }

    /// Jump to the start of a scene; out-of-range indices are ignored
    pub fn seek_to_scene(&mut self, index: usize) {
        self.scheduler.seek_to_scene(index);
    }

    /// Set the playback speed, clamped to `[0.25, 4]`
    pub fn set_playback_speed(&mut self, factor: f64) {
        self.scheduler.set_speed(factor);
    }

    /// Flip looping
    pub fn toggle_loop(&mut self) {
        self.scheduler.toggle_loop();
    }

    /// Merge entries into the context passed to executors
    pub fn set_execution_context(&mut self, partial: ExecutionContext) {
        self.context.merge(partial);
    }

    /// Process one tick at host timestamp `now_ms`
    pub fn tick(&mut self, now_ms: f64) -> TickReport {
        match self.scheduler.advance(now_ms) {
            TickOutcome::Ignored => TickReport::Ignored,
            TickOutcome::Finished => TickReport::Finished,
            TickOutcome::Transitioned { scene_index } => TickReport::Transitioned { scene_index },
            TickOutcome::Dispatch { scene_index, time } => {
                let Some(scene) = self.scheduler.timeline().scene(scene_index) else {
                    return TickReport::Ignored;
                };
                let report = self.dispatcher.dispatch(scene, time, &self.context);
                self.scheduler
                    .record_executed(report.executed.iter().map(|(id, _)| *id));
                TickReport::Dispatched {
                    scene_index,
                    time,
                    report,
                }
            }
        }
    }

    /// Tick from `source` until playback is idle, the source runs dry, or
    /// `max_ticks` ticks were processed. Returns the number of ticks.
    pub fn run_until_idle(&mut self, source: &mut dyn TickSource, max_ticks: usize) -> usize {
        self.drive(source, max_ticks, |_, _| {})
    }

    /// Like [`Engine::run_until_idle`], calling `on_tick` after every tick
    pub fn drive<F>(&mut self, source: &mut dyn TickSource, max_ticks: usize, mut on_tick: F) -> usize
    where
        F: FnMut(&mut Self, &TickReport),
    {
        let mut ticks = 0;
        while ticks < max_ticks {
            let Some(now) = source.next_tick() else {
                break;
            };
            let report = self.tick(now);
            ticks += 1;
            on_tick(self, &report);
            if self.scheduler.state() == PlaybackState::Idle {
                break;
            }
        }
        ticks
    }

    /// Get pending playback events and clear them
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        self.scheduler.take_events()
    }

    /// Get the playback state
    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    /// Get the `{is_playing, is_paused}` pair
    pub fn status(&self) -> PlaybackStatus {
        self.scheduler.status()
    }

    /// Whether a run is in progress (a paused run counts)
    pub fn is_playing(&self) -> bool {
        self.status().is_playing
    }

    /// Whether playback is paused
    pub fn is_paused(&self) -> bool {
        self.status().is_paused
    }

    /// Time within the current scene (ms)
    pub fn current_time(&self) -> f64 {
        self.scheduler.current_time()
    }

    /// Index of the current scene
    pub fn current_scene_index(&self) -> usize {
        self.scheduler.scene_index()
    }

    /// Get the current scene
    pub fn current_scene(&self) -> Option<&Scene> {
        self.scheduler.current_scene()
    }

    /// Fraction of the current scene elapsed
    pub fn scene_progress(&self) -> f64 {
        self.scheduler.scene_progress()
    }

    /// Playback speed multiplier
    pub fn speed(&self) -> f64 {
        self.scheduler.speed()
    }

    /// Whether playback loops
    pub fn is_looping(&self) -> bool {
        self.scheduler.is_looping()
    }

    /// Actions observed active since the last scene change or seek
    pub fn executed_actions(&self) -> Vec<ActionId> {
        self.scheduler.executed_actions().copied().collect()
    }

    /// Get the installed timeline
    pub fn timeline(&self) -> &Timeline {
        self.scheduler.timeline()
    }

    /// Get the execution context
    pub fn execution_context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Get the configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn reject_out_of_bounds(timeline: &Timeline) -> Result<()> {
    for scene in timeline.scenes() {
        if let Some(action) = scene.out_of_bounds_actions().next() {
            return Err(TimelineError::ActionOutOfBounds {
                scene: scene.id,
                action: action.id,
                end: action.end_time(),
                scene_duration: scene.duration,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutorError;
    use crate::model::Action;
    use crate::tick::ManualTickSource;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Calls = Rc<RefCell<Vec<(ActionId, f64)>>>;

    fn engine_with_calls(config: EngineConfig) -> (Engine, Calls) {
        let calls = Calls::default();
        let sink = Rc::clone(&calls);
        let mut registry = ExecutorRegistry::new();
        registry.set_fallback(move |action: &Action, progress: f64, _: &ExecutionContext| {
            sink.borrow_mut().push((action.id, progress));
            Ok::<(), ExecutorError>(())
        });
        (Engine::with_config(registry, config), calls)
    }

    fn single_scene() -> (Timeline, ActionId) {
        let action = Action::new(ActionKind::Draw, 0.0, 500.0);
        let id = action.id;
        (Timeline::new().with_scene(Scene::new("Only", 1000.0).with_action(action)), id)
    }

    #[test]
    fn test_half_way_progress_then_idle() {
        let (mut engine, _) = engine_with_calls(EngineConfig::default());
        let (timeline, action) = single_scene();
        engine.set_timeline(timeline).unwrap();
        engine.play();

        let mut source = ManualTickSource::new(100.0);
        let mut action_quarter = None;
        let mut scene_halfway = None;
        let ticks = engine.drive(&mut source, 100, |engine, report| {
            if let TickReport::Dispatched { time, report, .. } = report {
                if (*time - 200.0).abs() < 1e-9 {
                    action_quarter = report.progress_of(action);
                }
                if (*time - 500.0).abs() < 1e-9 {
                    scene_halfway = Some(engine.scene_progress());
                    assert_eq!(report.progress_of(action), Some(1.0));
                    assert_eq!(engine.executed_actions(), vec![action]);
                }
            }
        });

        assert!((action_quarter.unwrap() - 0.4).abs() < 1e-9);
        assert!((scene_halfway.unwrap() - 0.5).abs() < 1e-9);
        // Anchor tick plus ten 100ms steps
        assert_eq!(ticks, 11);
        assert_eq!(engine.state(), PlaybackState::Idle);
        assert_eq!(engine.current_time(), 0.0);
    }

    #[test]
    fn test_double_speed_takes_half_the_ticks() {
        let run = |speed: f64| {
            let (mut engine, _) = engine_with_calls(EngineConfig::default());
            let (timeline, _) = single_scene();
            engine.set_timeline(timeline).unwrap();
            engine.set_playback_speed(speed);
            engine.play();

            let mut source = ManualTickSource::new(50.0);
            let mut ticks = 0;
            while engine.current_time() < 800.0 {
                engine.tick(source.next_tick().unwrap());
                ticks += 1;
            }
            ticks
        };

        // Both runs include the anchoring tick
        assert_eq!(run(1.0) - 1, 2 * (run(2.0) - 1));
    }

    #[test]
    fn test_speed_above_range_is_clamped() {
        let (mut engine, _) = engine_with_calls(EngineConfig::default());
        engine.set_playback_speed(10.0);
        assert_eq!(engine.speed(), 4.0);
    }

    #[test]
    fn test_progress_is_monotonic_while_active() {
        let (mut engine, calls) = engine_with_calls(EngineConfig::default());
        let action = Action::new(ActionKind::Move, 100.0, 600.0).with_easing("easeInOutCubic");
        let timeline = Timeline::new().with_scene(Scene::new("A", 1000.0).with_action(action));
        engine.set_timeline(timeline).unwrap();
        engine.play();
        engine.run_until_idle(&mut ManualTickSource::new(16.0), 1000);

        let calls = calls.borrow();
        assert!(calls.len() > 30);
        assert!(calls.windows(2).all(|pair| pair[0].1 <= pair[1].1));
    }

    #[test]
    fn test_no_dispatch_after_finish() {
        let (mut engine, calls) = engine_with_calls(EngineConfig::default());
        let (timeline, _) = single_scene();
        engine.set_timeline(timeline).unwrap();
        engine.play();

        let mut source = ManualTickSource::new(100.0);
        engine.run_until_idle(&mut source, 100);
        let count = calls.borrow().len();

        for _ in 0..10 {
            assert_eq!(engine.tick(source.next_tick().unwrap()), TickReport::Ignored);
        }
        assert_eq!(calls.borrow().len(), count);
    }

    #[test]
    fn test_stop_halts_dispatch() {
        let (mut engine, calls) = engine_with_calls(EngineConfig::default());
        let (timeline, _) = single_scene();
        engine.set_timeline(timeline).unwrap();
        engine.play();
        engine.tick(0.0);
        engine.tick(100.0);
        engine.stop();

        let count = calls.borrow().len();
        assert_eq!(engine.tick(200.0), TickReport::Ignored);
        assert_eq!(calls.borrow().len(), count);
        assert!(engine.executed_actions().is_empty());
    }

    #[test]
    fn test_looping_never_stops() {
        let config = EngineConfig {
            looping: true,
            ..EngineConfig::default()
        };
        let (mut engine, _) = engine_with_calls(config);
        engine.set_timeline(
            Timeline::new()
                .with_scene(Scene::new("A", 100.0))
                .with_scene(Scene::new("B", 100.0)),
        )
        .unwrap();
        engine.play();

        let ticks = engine.run_until_idle(&mut ManualTickSource::new(30.0), 500);
        assert_eq!(ticks, 500);
        assert!(engine.is_playing());
        assert!(!engine.take_events().contains(&PlaybackEvent::Stopped));
    }

    #[test]
    fn test_unregistered_kind_fails_fast() {
        let mut engine = Engine::new(ExecutorRegistry::new().with(
            ActionKind::Draw,
            |_: &Action, _: f64, _: &ExecutionContext| Ok::<(), ExecutorError>(()),
        ));
        let (timeline, _) = single_scene();
        engine.set_timeline(timeline.clone()).unwrap();

        let bad = Timeline::new().with_scene(
            Scene::new("Bad", 100.0).with_action(Action::new(ActionKind::Custom("laser".into()), 0.0, 10.0)),
        );
        assert!(matches!(
            engine.set_timeline(bad),
            Err(TimelineError::UnregisteredKind { .. })
        ));
        // The previous timeline is still installed
        assert_eq!(engine.timeline(), &timeline);
    }

    #[test]
    fn test_bounds_policies() {
        let overlong = Timeline::new()
            .with_scene(Scene::new("A", 100.0).with_action(Action::new(ActionKind::Zoom, 50.0, 100.0)));

        let (mut allow, _) = engine_with_calls(EngineConfig::default());
        allow.set_timeline(overlong.clone()).unwrap();
        assert_eq!(allow.timeline().scene(0).unwrap().actions[0].duration, 100.0);

        let (mut clamp, _) = engine_with_calls(EngineConfig {
            action_bounds: ActionBoundsPolicy::Clamp,
            ..EngineConfig::default()
        });
        clamp.set_timeline(overlong.clone()).unwrap();
        assert_eq!(clamp.timeline().scene(0).unwrap().actions[0].duration, 50.0);

        let (mut reject, _) = engine_with_calls(EngineConfig {
            action_bounds: ActionBoundsPolicy::Reject,
            ..EngineConfig::default()
        });
        assert!(matches!(
            reject.set_timeline(overlong),
            Err(TimelineError::ActionOutOfBounds { end, .. }) if end == 150.0
        ));
    }

    #[test]
    fn test_execution_context_merges() {
        let (mut engine, _) = engine_with_calls(EngineConfig::default());
        engine.set_execution_context(ExecutionContext::new().with("canvas", 1_u32));
        engine.set_execution_context(ExecutionContext::new().with("audio", 2_u32));
        engine.set_execution_context(ExecutionContext::new().with("canvas", 3_u32));

        let context = engine.execution_context();
        assert_eq!(context.get::<u32>("canvas"), Some(&3));
        assert_eq!(context.get::<u32>("audio"), Some(&2));
    }

    #[test]
    fn test_config_is_applied() {
        let (engine, _) = engine_with_calls(EngineConfig {
            initial_speed: 9.0,
            looping: true,
            ..EngineConfig::default()
        });
        assert_eq!(engine.speed(), 4.0);
        assert!(engine.is_looping());
        assert_eq!(engine.current_scene_index(), 0);
        assert!(engine.current_scene().is_none());
    }
}
