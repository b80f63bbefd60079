// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tick sources that drive the scheduler.
//!
//! The engine treats a tick source as a black box producing timestamps in
//! milliseconds. [`ManualTickSource`] is deterministic and is what tests use;
//! [`FrameClock`] paces ticks against the wall clock.

use std::time::{Duration, Instant};

/// Produces the timestamps at which the engine is ticked
pub trait TickSource {
    /// Timestamp (ms) of the next tick, or `None` when the source is exhausted
    fn next_tick(&mut self) -> Option<f64>;
}

/// Deterministic tick source advancing by a fixed step
#[derive(Debug, Clone)]
pub struct ManualTickSource {
    now: f64,
    step: f64,
    remaining: Option<usize>,
}

impl ManualTickSource {
    /// Ticks at `0, step, 2 * step, ...`
    pub fn new(step_ms: f64) -> Self {
        Self {
            now: 0.0,
            step: step_ms,
            remaining: None,
        }
    }

    /// Start counting from `now` instead of zero
    pub fn starting_at(mut self, now: f64) -> Self {
        self.now = now;
        self
    }

    /// Stop after `count` ticks
    pub fn with_limit(mut self, count: usize) -> Self {
        self.remaining = Some(count);
        self
    }

    /// Change the step used for following ticks
    pub fn set_step(&mut self, step_ms: f64) {
        self.step = step_ms;
    }

    /// Move the clock without producing a tick
    pub fn skip(&mut self, duration_ms: f64) {
        self.now += duration_ms;
    }

    /// Timestamp the next tick will report
    pub fn now(&self) -> f64 {
        self.now
    }
}

impl TickSource for ManualTickSource {
    fn next_tick(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        let now = self.now;
        self.now += self.step;
        Some(now)
    }
}

/// Frame interval used for unusable frame rates (60 fps)
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_nanos(16_666_667);

/// Wall-clock tick source sleeping until the next frame boundary
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    interval: Duration,
    next_frame: Instant,
}

impl FrameClock {
    /// Tick every `interval`
    pub fn new(interval: Duration) -> Self {
        let origin = Instant::now();
        Self {
            origin,
            interval,
            next_frame: origin,
        }
    }

    /// Tick at a frame rate (frames per second).
    ///
    /// Rates that are not positive, or too small to express as a frame
    /// interval, fall back to 60 fps.
    pub fn with_frame_rate(fps: f64) -> Self {
        let interval = Some(fps)
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f64(1.0 / fps).ok())
            .unwrap_or(DEFAULT_FRAME_INTERVAL);
        Self::new(interval)
    }

    /// Time between ticks
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl TickSource for FrameClock {
    fn next_tick(&mut self) -> Option<f64> {
        let now = Instant::now();
        if self.next_frame > now {
            std::thread::sleep(self.next_frame - now);
        }

        let tick = Instant::now();
        self.next_frame += self.interval;
        // Drop frames we fell behind on instead of bursting to catch up
        if self.next_frame < tick {
            self.next_frame = tick + self.interval;
        }

        Some(tick.duration_since(self.origin).as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_source_steps() {
        let mut source = ManualTickSource::new(16.0).starting_at(100.0).with_limit(3);
        assert_eq!(source.next_tick(), Some(100.0));
        assert_eq!(source.next_tick(), Some(116.0));
        source.skip(1000.0);
        assert_eq!(source.next_tick(), Some(1132.0));
        assert_eq!(source.next_tick(), None);
    }

    #[test]
    fn test_frame_clock_is_monotonic() {
        let mut clock = FrameClock::new(Duration::from_millis(1));
        let first = clock.next_tick().unwrap();
        let second = clock.next_tick().unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_unusable_frame_rates_fall_back() {
        assert_eq!(FrameClock::with_frame_rate(1e-20).interval(), DEFAULT_FRAME_INTERVAL);
        assert_eq!(FrameClock::with_frame_rate(0.0).interval(), DEFAULT_FRAME_INTERVAL);
        assert_eq!(FrameClock::with_frame_rate(-30.0).interval(), DEFAULT_FRAME_INTERVAL);
        assert_eq!(FrameClock::with_frame_rate(f64::NAN).interval(), DEFAULT_FRAME_INTERVAL);
        assert_eq!(FrameClock::with_frame_rate(4.0).interval(), Duration::from_millis(250));
    }
}
