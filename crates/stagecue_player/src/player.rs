// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback session: pre-roll, frame-clocked playback and auto-recording.

use crate::config::PlayerConfig;
use crate::demo::{self, Canvas};
use crate::recorder::SimulatedRecorder;
use stagecue_recorder::{AutoRecordCoordinator, Countdown, CountdownStatus, RecordingController};
use stagecue_timeline::{
    Engine, ExecutionContext, FrameClock, PlaybackEvent, TickReport, TickSource, TimelineError,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Errors that end a player session
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// The timeline could not be installed
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Config parse error
    #[error("Config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What happened during a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    /// Ticks processed during playback
    pub ticks: usize,
    /// Executor failures reported by the dispatcher
    pub failures: usize,
    /// Scenes entered after the first
    pub scene_changes: usize,
    /// Whether the timeline played to its end
    pub finished: bool,
    /// Whether playback was stopped because capture was revoked
    pub revoked: bool,
    /// Elements left on the canvas
    pub elements: usize,
}

/// Run one demo session
pub fn run(config: &PlayerConfig) -> Result<SessionSummary, PlayerError> {
    let canvas = Arc::new(Canvas::new());
    let mut engine = Engine::with_config(demo::registry(), config.engine.clone());
    let mut context = ExecutionContext::new();
    context.insert_shared(demo::CANVAS, canvas.clone());
    engine.set_execution_context(context);
    engine.set_timeline(demo::timeline())?;
    engine.take_events();

    let timeline = engine.timeline();
    tracing::info!(
        "Loaded {} scenes ({:.1}s)",
        timeline.scene_count(),
        timeline.total_duration() / 1000.0
    );

    let recorder = Arc::new(SimulatedRecorder::new(Duration::from_millis(config.recorder_latency_ms)));
    let controller: Arc<dyn RecordingController> = recorder.clone();
    let mut coordinator = AutoRecordCoordinator::new(controller, config.recording.clone());

    let mut clock = FrameClock::with_frame_rate(config.frame_rate);
    preroll(config.preroll_seconds, &mut clock);

    engine.play();
    for event in engine.take_events() {
        log_event(&event);
    }
    coordinator.observe(engine.status());

    let mut summary = SessionSummary::default();
    let mut last_frame = Instant::now();
    let mut played = Duration::ZERO;
    let revoke_after = config.revoke_capture_after_ms.and_then(millis_to_duration);

    let ticks = engine.drive(&mut clock, config.max_ticks, |engine, report| {
        let elapsed = last_frame.elapsed();
        last_frame = Instant::now();

        match report {
            TickReport::Dispatched { report, .. } => summary.failures += report.failures.len(),
            TickReport::Finished => summary.finished = true,
            TickReport::Transitioned { .. } | TickReport::Ignored => {}
        }
        for event in engine.take_events() {
            if matches!(event, PlaybackEvent::SceneEntered { .. }) {
                summary.scene_changes += 1;
            }
            log_event(&event);
        }

        if engine.is_playing() && !engine.is_paused() {
            played += elapsed;
        }
        if revoke_after.is_some_and(|after| played >= after) && !summary.revoked {
            recorder.revoke();
        }
        if recorder.take_revocation() {
            tracing::warn!("Capture ended externally; stopping playback");
            summary.revoked = true;
            engine.stop();
        }

        coordinator.observe(engine.status());
        coordinator.update(elapsed);
    });
    summary.ticks = ticks;

    if engine.is_playing() {
        tracing::warn!("Tick limit of {} reached; stopping", config.max_ticks);
        engine.stop();
    }
    for event in engine.take_events() {
        log_event(&event);
    }
    coordinator.observe(engine.status());
    // A start still in flight is undone by the coordinator once it resolves
    if coordinator.wait_for_start() {
        coordinator.observe(engine.status());
    }

    summary.elements = canvas.element_count();
    tracing::info!(
        "Session over: {} ticks, {} scene changes, {} executor failures, {:.2}s recorded",
        summary.ticks,
        summary.scene_changes,
        summary.failures,
        recorder.recorded().as_secs_f64()
    );
    Ok(summary)
}

/// Visible countdown before playback, one log line per second
fn preroll(seconds: u32, clock: &mut dyn TickSource) {
    if seconds == 0 {
        return;
    }

    let mut countdown = Countdown::new(seconds).with_on_complete(|| tracing::info!("Go!"));
    countdown.set_active(true);
    tracing::info!("Starting in {}", seconds);

    let mut last = None;
    let mut shown = seconds;
    while let Some(now) = clock.next_tick() {
        let elapsed = last.map_or(0.0, |last: f64| (now - last).max(0.0));
        last = Some(now);
        let elapsed = millis_to_duration(elapsed).unwrap_or(Duration::MAX);
        match countdown.advance(elapsed) {
            CountdownStatus::Counting { remaining } => {
                if remaining != shown {
                    shown = remaining;
                    tracing::info!("Starting in {}", remaining);
                }
            }
            CountdownStatus::Completed | CountdownStatus::Elapsed | CountdownStatus::Inactive => break,
        }
    }
}

/// Convert host milliseconds, rejecting values a `Duration` cannot hold
fn millis_to_duration(ms: f64) -> Option<Duration> {
    match Duration::try_from_secs_f64(ms / 1000.0) {
        Ok(duration) => Some(duration),
        Err(e) => {
            tracing::warn!("Ignoring duration of {}ms: {}", ms, e);
            None
        }
    }
}

fn log_event(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::SceneEntered { index } => tracing::info!("Scene {}", index + 1),
        PlaybackEvent::Finished => tracing::info!("Timeline finished"),
        other => tracing::debug!("Playback event: {:?}", other),
    }
}
