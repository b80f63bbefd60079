// SPDX-License-Identifier: MIT OR Apache-2.0
//! Whole-second countdown timer.
//!
//! The countdown knows nothing about playback or recording. It decrements
//! once per elapsed second while active, fires its completion callback when
//! it reaches zero, and rewinds to the full count whenever it is deactivated.

use std::fmt;
use std::time::Duration;

const SECOND: Duration = Duration::from_secs(1);

/// Result of advancing a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStatus {
    /// The countdown is not running
    Inactive,
    /// Still counting
    Counting {
        /// Whole seconds left
        remaining: u32,
    },
    /// Reached zero during this call
    Completed,
    /// Reached zero earlier and is waiting to be reset
    Elapsed,
}

/// Decrementing timer with a completion callback
pub struct Countdown {
    total_seconds: u32,
    remaining: u32,
    active: bool,
    completed: bool,
    carry: Duration,
    on_complete: Option<Box<dyn FnMut() + Send>>,
}

impl Countdown {
    /// Create an inactive countdown from `total_seconds`
    pub fn new(total_seconds: u32) -> Self {
        Self {
            total_seconds,
            remaining: total_seconds,
            active: false,
            completed: false,
            carry: Duration::ZERO,
            on_complete: None,
        }
    }

    /// Set the callback fired when the countdown reaches zero
    pub fn with_on_complete(mut self, on_complete: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Activate or deactivate. Deactivating rewinds to the full count.
    pub fn set_active(&mut self, active: bool) {
        if active == self.active {
            return;
        }
        self.active = active;
        if !active {
            self.remaining = self.total_seconds;
            self.completed = false;
            self.carry = Duration::ZERO;
        }
    }

    /// Feed elapsed wall-clock time
    pub fn advance(&mut self, elapsed: Duration) -> CountdownStatus {
        if !self.active {
            return CountdownStatus::Inactive;
        }
        if self.completed {
            return CountdownStatus::Elapsed;
        }

        self.carry = self.carry.saturating_add(elapsed);
        while self.remaining > 0 && self.carry >= SECOND {
            self.carry -= SECOND;
            self.remaining -= 1;
            tracing::debug!("Countdown: {}", self.remaining);
        }

        if self.remaining > 0 {
            return CountdownStatus::Counting {
                remaining: self.remaining,
            };
        }

        self.completed = true;
        if let Some(on_complete) = self.on_complete.as_mut() {
            on_complete();
        }
        CountdownStatus::Completed
    }

    /// Whether the countdown is running
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whole seconds left
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Starting count
    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("total_seconds", &self.total_seconds)
            .field("remaining", &self.remaining)
            .field("active", &self.active)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}
