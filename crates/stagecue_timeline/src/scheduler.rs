// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback state machine and tick-driven time advancement.

use crate::model::{ActionId, Scene, Timeline};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Slowest allowed playback speed
pub const MIN_SPEED: f64 = 0.25;

/// Fastest allowed playback speed
pub const MAX_SPEED: f64 = 4.0;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Not playing; position is at the start
    #[default]
    Idle,
    /// Advancing on every tick
    Playing,
    /// Holding position until resumed
    Paused,
}

impl PlaybackState {
    /// Whether a run is in progress (playing or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

/// The `{is_playing, is_paused}` pair observed by outside state machines.
///
/// A paused run still counts as playing; only `stop()` (or reaching the end)
/// clears `is_playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlaybackStatus {
    /// A run is in progress
    pub is_playing: bool,
    /// The run is paused
    pub is_paused: bool,
}

impl PlaybackStatus {
    /// Playing and not paused
    pub fn is_running(&self) -> bool {
        self.is_playing && !self.is_paused
    }

    /// Neither playing nor paused
    pub fn is_stopped(&self) -> bool {
        !self.is_playing && !self.is_paused
    }
}

impl From<PlaybackState> for PlaybackStatus {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Idle => Self { is_playing: false, is_paused: false },
            PlaybackState::Playing => Self { is_playing: true, is_paused: false },
            PlaybackState::Paused => Self { is_playing: true, is_paused: true },
        }
    }
}

/// Something that happened during playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// Playback started from idle
    Started,
    /// Playback paused
    Paused,
    /// Playback resumed from pause
    Resumed,
    /// Playback stopped and rewound
    Stopped,
    /// The last scene ended without looping
    Finished,
    /// A scene became current
    SceneEntered {
        /// Index of the scene
        index: usize,
    },
    /// Playback wrapped from the last scene back to the first
    Looped,
    /// Position was set directly
    Seeked {
        /// New time within the current scene
        time: f64,
    },
    /// A new timeline was installed
    TimelineReplaced {
        /// Number of scenes in it
        scene_count: usize,
    },
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Playback was not running; nothing changed
    Ignored,
    /// One or more scene transitions happened; nothing to dispatch
    Transitioned {
        /// Scene that is current after the transitions
        scene_index: usize,
    },
    /// The timeline ended and playback stopped
    Finished,
    /// Actions of the current scene should run at `time`
    Dispatch {
        /// Current scene
        scene_index: usize,
        /// Time within the scene
        time: f64,
    },
}

/// Owns the timeline and its playback state
#[derive(Debug, Clone)]
pub struct Scheduler {
    timeline: Timeline,
    state: PlaybackState,
    current_time: f64,
    scene_index: usize,
    speed: f64,
    looping: bool,
    executed: IndexSet<ActionId>,
    /// Timestamp of the last processed tick; `None` means the next tick anchors
    last_tick: Option<f64>,
    max_advances_per_tick: Option<usize>,
    events: Vec<PlaybackEvent>,
}

impl Scheduler {
    /// Create an idle scheduler with an empty timeline
    pub fn new() -> Self {
        Self {
            timeline: Timeline::new(),
            state: PlaybackState::Idle,
            current_time: 0.0,
            scene_index: 0,
            speed: 1.0,
            looping: false,
            executed: IndexSet::new(),
            last_tick: None,
            max_advances_per_tick: None,
            events: Vec::new(),
        }
    }

    /// Replace the timeline. Playback returns to idle at the first scene.
    pub fn set_timeline(&mut self, timeline: Timeline) {
        if self.state.is_active() {
            self.events.push(PlaybackEvent::Stopped);
        }
        self.state = PlaybackState::Idle;
        self.timeline = timeline;
        self.rewind();
        self.events.push(PlaybackEvent::TimelineReplaced {
            scene_count: self.timeline.scene_count(),
        });
        tracing::info!("Timeline set: {} scenes", self.timeline.scene_count());
    }

    /// Start or continue playback
    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Idle => {
                self.events.push(PlaybackEvent::Started);
                tracing::info!("Playback started at scene {}", self.scene_index);
            }
            PlaybackState::Paused => {
                self.events.push(PlaybackEvent::Resumed);
                tracing::info!("Playback resumed");
            }
            PlaybackState::Playing => {}
        }
        self.state = PlaybackState::Playing;
        self.last_tick = None;
    }

    /// Pause playback. Only affects a playing scheduler.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.events.push(PlaybackEvent::Paused);
            tracing::info!("Playback paused at {:.1}ms", self.current_time);
        }
    }

    /// Resume a paused scheduler
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.play();
        }
    }

    /// Stop and rewind to the start of the first scene
    pub fn stop(&mut self) {
        if self.state.is_active() {
            tracing::info!("Playback stopped");
            self.events.push(PlaybackEvent::Stopped);
        }
        self.state = PlaybackState::Idle;
        self.rewind();
    }

    /// Jump to `time` within the current scene
    pub fn seek_to(&mut self, time: f64) {
        if !time.is_finite() {
            tracing::warn!("Ignoring seek to non-finite time {}", time);
            return;
        }
        self.current_time = time;
        self.executed.clear();
        self.last_tick = None;
        self.events.push(PlaybackEvent::Seeked { time });
    }

    /// Jump to the start of scene `index`. Out-of-range indices are ignored.
    pub fn seek_to_scene(&mut self, index: usize) {
        if index >= self.timeline.scene_count() {
            tracing::debug!("Ignoring seek to missing scene {}", index);
            return;
        }
        self.enter_scene(index);
        self.last_tick = None;
    }

    /// Set the playback speed, clamped to `[MIN_SPEED, MAX_SPEED]`
    pub fn set_speed(&mut self, factor: f64) {
        if factor.is_nan() {
            tracing::warn!("Ignoring NaN playback speed");
            return;
        }
        self.speed = factor.clamp(MIN_SPEED, MAX_SPEED);
    }

    /// Flip looping on or off
    pub fn toggle_loop(&mut self) {
        self.looping = !self.looping;
    }

    /// Set looping
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Cap on scene transitions processed by one tick; `None` uses the scene count
    pub fn set_max_advances_per_tick(&mut self, cap: Option<usize>) {
        self.max_advances_per_tick = cap;
    }

    /// Advance playback to the host timestamp `now` (ms).
    ///
    /// Ticks received while not playing are dropped, not queued.
    pub fn advance(&mut self, now: f64) -> TickOutcome {
        if self.state != PlaybackState::Playing {
            return TickOutcome::Ignored;
        }
        if !now.is_finite() {
            tracing::warn!("Ignoring tick with non-finite timestamp {}", now);
            return TickOutcome::Ignored;
        }

        let delta = match self.last_tick {
            // Clocks that step backwards never rewind playback
            Some(last) => (now - last).max(0.0) * self.speed,
            None => 0.0,
        };
        self.last_tick = Some(now);
        self.current_time += delta;

        let cap = self
            .max_advances_per_tick
            .unwrap_or(self.timeline.scene_count())
            .max(1);
        let mut advances = 0;

        loop {
            let Some(scene) = self.timeline.scene(self.scene_index) else {
                self.finish();
                return TickOutcome::Finished;
            };
            if self.current_time < scene.duration || advances >= cap {
                break;
            }

            if self.scene_index + 1 < self.timeline.scene_count() {
                self.enter_scene(self.scene_index + 1);
            } else if self.looping {
                self.events.push(PlaybackEvent::Looped);
                self.enter_scene(0);
            } else {
                self.finish();
                return TickOutcome::Finished;
            }
            advances += 1;
        }

        if advances > 0 {
            TickOutcome::Transitioned {
                scene_index: self.scene_index,
            }
        } else {
            TickOutcome::Dispatch {
                scene_index: self.scene_index,
                time: self.current_time,
            }
        }
    }

    /// Remember actions that have been observed active
    pub fn record_executed(&mut self, actions: impl IntoIterator<Item = ActionId>) {
        self.executed.extend(actions);
    }

    /// Get the timeline
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Get the playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Get the `{is_playing, is_paused}` pair
    pub fn status(&self) -> PlaybackStatus {
        self.state.into()
    }

    /// Time within the current scene (ms)
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Index of the current scene
    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    /// Get the current scene
    pub fn current_scene(&self) -> Option<&Scene> {
        self.timeline.scene(self.scene_index)
    }

    /// Playback speed multiplier
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Whether playback wraps around at the end
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Actions observed active since the last scene change or seek
    pub fn executed_actions(&self) -> impl Iterator<Item = &ActionId> {
        self.executed.iter()
    }

    /// Whether `action` has been observed active since the last reset
    pub fn has_executed(&self, action: ActionId) -> bool {
        self.executed.contains(&action)
    }

    /// Fraction of the current scene elapsed, in `[0, 1]`.
    ///
    /// Zero when there is no scene or the scene has no duration.
    pub fn scene_progress(&self) -> f64 {
        match self.current_scene() {
            Some(scene) if scene.duration > 0.0 => (self.current_time / scene.duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Get pending events and clear them
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }

    fn enter_scene(&mut self, index: usize) {
        self.scene_index = index;
        self.current_time = 0.0;
        self.executed.clear();
        self.events.push(PlaybackEvent::SceneEntered { index });
        tracing::debug!("Entered scene {}", index);
    }

    fn finish(&mut self) {
        self.events.push(PlaybackEvent::Finished);
        tracing::info!("Timeline finished");
        self.stop();
    }

    fn rewind(&mut self) {
        self.current_time = 0.0;
        self.scene_index = 0;
        self.executed.clear();
        self.last_tick = None;
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(durations: &[f64]) -> Timeline {
        durations.iter().enumerate().fold(Timeline::new(), |timeline, (i, duration)| {
            timeline.with_scene(Scene::new(format!("Scene {i}"), *duration))
        })
    }

    fn playing(durations: &[f64]) -> Scheduler {
        let mut scheduler = Scheduler::new();
        scheduler.set_timeline(timeline(durations));
        scheduler.play();
        scheduler.advance(0.0);
        scheduler
    }

    #[test]
    fn test_state_transitions() {
        let mut scheduler = Scheduler::new();
        scheduler.set_timeline(timeline(&[1000.0]));
        assert_eq!(scheduler.state(), PlaybackState::Idle);

        scheduler.resume();
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        scheduler.pause();
        assert_eq!(scheduler.state(), PlaybackState::Idle);

        scheduler.play();
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        scheduler.pause();
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert_eq!(
            scheduler.status(),
            PlaybackStatus { is_playing: true, is_paused: true }
        );
        scheduler.resume();
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        scheduler.stop();
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(scheduler.status().is_stopped());
    }

    #[test]
    fn test_first_tick_after_play_has_no_delta() {
        let mut scheduler = Scheduler::new();
        scheduler.set_timeline(timeline(&[1000.0]));
        scheduler.play();
        assert_eq!(
            scheduler.advance(50_000.0),
            TickOutcome::Dispatch { scene_index: 0, time: 0.0 }
        );
        scheduler.advance(50_100.0);
        assert_eq!(scheduler.current_time(), 100.0);
    }

    #[test]
    fn test_ticks_ignored_while_not_playing() {
        let mut scheduler = playing(&[1000.0]);
        scheduler.advance(100.0);
        scheduler.pause();
        assert_eq!(scheduler.advance(400.0), TickOutcome::Ignored);
        assert_eq!(scheduler.current_time(), 100.0);

        // Resuming re-anchors: the paused interval is not caught up
        scheduler.resume();
        scheduler.advance(900.0);
        assert_eq!(scheduler.current_time(), 100.0);
        scheduler.advance(950.0);
        assert_eq!(scheduler.current_time(), 150.0);

        scheduler.stop();
        assert_eq!(scheduler.advance(2000.0), TickOutcome::Ignored);
    }

    #[test]
    fn test_backwards_clock_does_not_rewind() {
        let mut scheduler = playing(&[1000.0]);
        scheduler.advance(200.0);
        scheduler.advance(150.0);
        assert_eq!(scheduler.current_time(), 200.0);
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut scheduler = Scheduler::new();
        scheduler.set_speed(10.0);
        assert_eq!(scheduler.speed(), MAX_SPEED);
        scheduler.set_speed(0.0);
        assert_eq!(scheduler.speed(), MIN_SPEED);
        scheduler.set_speed(f64::NAN);
        assert_eq!(scheduler.speed(), MIN_SPEED);
        scheduler.set_speed(1.5);
        assert_eq!(scheduler.speed(), 1.5);
    }

    #[test]
    fn test_speed_scales_advancement() {
        let mut scheduler = playing(&[10_000.0]);
        scheduler.set_speed(2.0);
        scheduler.advance(100.0);
        assert_eq!(scheduler.current_time(), 200.0);
    }

    #[test]
    fn test_scenes_play_in_order_then_finish() {
        let mut scheduler = playing(&[100.0, 100.0, 100.0]);
        scheduler.take_events();

        let mut visited = vec![scheduler.scene_index()];
        let mut now = 0.0;
        while scheduler.state() == PlaybackState::Playing {
            now += 30.0;
            scheduler.advance(now);
            if scheduler.state() == PlaybackState::Playing && visited.last() != Some(&scheduler.scene_index()) {
                visited.push(scheduler.scene_index());
            }
        }

        assert_eq!(visited, vec![0, 1, 2]);
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert_eq!(scheduler.current_time(), 0.0);
        assert_eq!(scheduler.scene_index(), 0);

        let events = scheduler.take_events();
        assert!(events.contains(&PlaybackEvent::Finished));
        assert_eq!(events.last(), Some(&PlaybackEvent::Stopped));
    }

    #[test]
    fn test_looping_wraps_to_first_scene() {
        let mut scheduler = playing(&[100.0, 100.0]);
        scheduler.toggle_loop();

        let mut sequence = Vec::new();
        let mut now = 0.0;
        for _ in 0..40 {
            now += 25.0;
            if let TickOutcome::Transitioned { scene_index } = scheduler.advance(now) {
                sequence.push(scene_index);
            }
        }

        assert_eq!(scheduler.state(), PlaybackState::Playing);
        assert_eq!(&sequence[..5], &[1, 0, 1, 0, 1]);
        assert!(scheduler.take_events().contains(&PlaybackEvent::Looped));
    }

    #[test]
    fn test_transition_tick_resets_time() {
        let mut scheduler = playing(&[100.0, 500.0]);
        assert_eq!(
            scheduler.advance(130.0),
            TickOutcome::Transitioned { scene_index: 1 }
        );
        assert_eq!(scheduler.current_time(), 0.0);
    }

    #[test]
    fn test_zero_duration_scenes_are_bounded_per_tick() {
        let mut scheduler = Scheduler::new();
        scheduler.set_timeline(timeline(&[0.0, 0.0, 0.0]));
        scheduler.set_looping(true);
        scheduler.play();

        // Every scene is already finished; one tick may only cycle once
        let outcome = scheduler.advance(0.0);
        assert!(matches!(outcome, TickOutcome::Transitioned { .. }));
        let entered = scheduler
            .take_events()
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::SceneEntered { .. }))
            .count();
        assert_eq!(entered, 3);
        assert_eq!(scheduler.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_zero_duration_scene_is_skipped_in_one_tick() {
        let mut scheduler = playing(&[100.0, 0.0, 400.0]);
        assert_eq!(
            scheduler.advance(120.0),
            TickOutcome::Transitioned { scene_index: 2 }
        );
    }

    #[test]
    fn test_custom_transition_cap() {
        let mut scheduler = playing(&[10.0, 0.0, 0.0, 0.0, 500.0]);
        scheduler.set_max_advances_per_tick(Some(2));
        assert_eq!(
            scheduler.advance(20.0),
            TickOutcome::Transitioned { scene_index: 2 }
        );
        assert_eq!(
            scheduler.advance(20.0),
            TickOutcome::Transitioned { scene_index: 4 }
        );
    }

    #[test]
    fn test_seek_to() {
        let mut scheduler = playing(&[1000.0]);
        scheduler.record_executed([ActionId::new()]);
        scheduler.seek_to(600.0);
        assert_eq!(scheduler.executed_actions().count(), 0);

        scheduler.advance(5_000.0);
        assert!(scheduler.current_time() >= 600.0);
        scheduler.advance(5_010.0);
        assert_eq!(scheduler.current_time(), 610.0);

        scheduler.seek_to(f64::INFINITY);
        assert_eq!(scheduler.current_time(), 610.0);
    }

    #[test]
    fn test_seek_to_scene() {
        let mut scheduler = playing(&[1000.0, 1000.0]);
        scheduler.advance(300.0);

        scheduler.seek_to_scene(5);
        assert_eq!(scheduler.scene_index(), 0);
        assert_eq!(scheduler.current_time(), 300.0);

        scheduler.seek_to_scene(1);
        assert_eq!(scheduler.scene_index(), 1);
        assert_eq!(scheduler.current_time(), 0.0);
    }

    #[test]
    fn test_set_timeline_resets_playback() {
        let mut scheduler = playing(&[1000.0, 1000.0]);
        scheduler.seek_to_scene(1);
        scheduler.advance(100.0);

        scheduler.set_timeline(timeline(&[50.0]));
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert_eq!(scheduler.scene_index(), 0);
        assert_eq!(scheduler.current_time(), 0.0);
    }

    #[test]
    fn test_scene_progress() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.scene_progress(), 0.0);

        scheduler.set_timeline(timeline(&[1000.0]));
        scheduler.seek_to(250.0);
        assert_eq!(scheduler.scene_progress(), 0.25);
    }

    #[test]
    fn test_stop_while_idle_reports_nothing() {
        let mut scheduler = Scheduler::new();
        scheduler.set_timeline(timeline(&[1000.0]));
        scheduler.take_events();

        scheduler.stop();
        assert!(scheduler.take_events().is_empty());

        scheduler.play();
        scheduler.pause();
        scheduler.take_events();
        scheduler.stop();
        assert_eq!(scheduler.take_events(), vec![PlaybackEvent::Stopped]);
    }

    #[test]
    fn test_scene_transition_clears_executed() {
        let mut scheduler = playing(&[100.0, 100.0]);
        scheduler.record_executed([ActionId::new(), ActionId::new()]);
        assert_eq!(scheduler.executed_actions().count(), 2);

        scheduler.advance(150.0);
        assert_eq!(scheduler.scene_index(), 1);
        assert_eq!(scheduler.executed_actions().count(), 0);
    }

    #[test]
    fn test_loop_wrap_clears_executed() {
        let mut scheduler = playing(&[100.0]);
        scheduler.set_looping(true);
        let action = ActionId::new();
        scheduler.record_executed([action]);

        assert_eq!(
            scheduler.advance(120.0),
            TickOutcome::Transitioned { scene_index: 0 }
        );
        assert!(!scheduler.has_executed(action));
        assert_eq!(scheduler.executed_actions().count(), 0);
    }

    #[test]
    fn test_seek_to_scene_clears_executed() {
        let mut scheduler = playing(&[1000.0, 1000.0]);
        scheduler.record_executed([ActionId::new()]);

        scheduler.seek_to_scene(1);
        assert_eq!(scheduler.executed_actions().count(), 0);
    }

    #[test]
    fn test_set_timeline_clears_executed() {
        let mut scheduler = playing(&[1000.0]);
        scheduler.record_executed([ActionId::new()]);

        scheduler.set_timeline(timeline(&[500.0, 500.0]));
        assert_eq!(scheduler.executed_actions().count(), 0);
    }

    #[test]
    fn test_empty_timeline_finishes_immediately() {
        let mut scheduler = Scheduler::new();
        scheduler.play();
        assert_eq!(scheduler.advance(0.0), TickOutcome::Finished);
        assert_eq!(scheduler.state(), PlaybackState::Idle);
    }
}
