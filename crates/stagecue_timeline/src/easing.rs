// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves used to remap action progress.
//!
//! Every curve maps `[0, 1]` onto `[0, 1]` with `0 -> 0` and `1 -> 1`; none
//! of them overshoot. Curves are addressed by string identifiers so that
//! timeline content can name them directly:
//!
//! ```
//! use stagecue_timeline::easing::{ease, Easing};
//!
//! assert_eq!(ease("linear", 0.25), 0.25);
//! assert_eq!(Easing::from_id("easeInQuad"), Some(Easing::InQuad));
//! // Unknown identifiers degrade to linear
//! assert_eq!(ease("wobble", 0.25), 0.25);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Identifier of the linear curve
pub const LINEAR: &str = "linear";

/// A supported easing curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Easing {
    /// No easing
    #[default]
    Linear,
    /// Quadratic ease-in
    InQuad,
    /// Quadratic ease-out
    OutQuad,
    /// Quadratic ease-in-out
    InOutQuad,
    /// Cubic ease-in
    InCubic,
    /// Cubic ease-out
    OutCubic,
    /// Cubic ease-in-out
    InOutCubic,
    /// Quartic ease-in
    InQuart,
    /// Quartic ease-out
    OutQuart,
    /// Quartic ease-in-out
    InOutQuart,
    /// Sine ease-in
    InSine,
    /// Sine ease-out
    OutSine,
    /// Sine ease-in-out
    InOutSine,
    /// Exponential ease-in
    InExpo,
    /// Exponential ease-out
    OutExpo,
    /// Exponential ease-in-out
    InOutExpo,
    /// Bounce that settles at the end
    OutBounce,
    /// Bounce at the start
    InBounce,
    /// Bounce at both ends
    InOutBounce,
}

impl Easing {
    /// Every supported curve
    pub const ALL: [Easing; 19] = [
        Easing::Linear,
        Easing::InQuad,
        Easing::OutQuad,
        Easing::InOutQuad,
        Easing::InCubic,
        Easing::OutCubic,
        Easing::InOutCubic,
        Easing::InQuart,
        Easing::OutQuart,
        Easing::InOutQuart,
        Easing::InSine,
        Easing::OutSine,
        Easing::InOutSine,
        Easing::InExpo,
        Easing::OutExpo,
        Easing::InOutExpo,
        Easing::OutBounce,
        Easing::InBounce,
        Easing::InOutBounce,
    ];

    /// Get the identifier used in timeline content
    pub fn id(&self) -> &'static str {
        match self {
            Self::Linear => LINEAR,
            Self::InQuad => "easeInQuad",
            Self::OutQuad => "easeOutQuad",
            Self::InOutQuad => "easeInOutQuad",
            Self::InCubic => "easeInCubic",
            Self::OutCubic => "easeOutCubic",
            Self::InOutCubic => "easeInOutCubic",
            Self::InQuart => "easeInQuart",
            Self::OutQuart => "easeOutQuart",
            Self::InOutQuart => "easeInOutQuart",
            Self::InSine => "easeInSine",
            Self::OutSine => "easeOutSine",
            Self::InOutSine => "easeInOutSine",
            Self::InExpo => "easeInExpo",
            Self::OutExpo => "easeOutExpo",
            Self::InOutExpo => "easeInOutExpo",
            Self::OutBounce => "easeOutBounce",
            Self::InBounce => "easeInBounce",
            Self::InOutBounce => "easeInOutBounce",
        }
    }

    /// Look up a curve by identifier
    pub fn from_id(id: &str) -> Option<Self> {
        if id == "bounce" {
            return Some(Self::OutBounce);
        }
        Self::ALL.iter().copied().find(|easing| easing.id() == id)
    }

    /// Evaluate the curve. Input is clamped to `[0, 1]`.
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t).powi(2),
            Self::InOutQuad => in_out_power(t, 2),
            Self::InCubic => t.powi(3),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => in_out_power(t, 3),
            Self::InQuart => t.powi(4),
            Self::OutQuart => 1.0 - (1.0 - t).powi(4),
            Self::InOutQuart => in_out_power(t, 4),
            Self::InSine => 1.0 - (t * PI / 2.0).cos(),
            Self::OutSine => (t * PI / 2.0).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::InExpo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Self::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::InOutExpo => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Self::OutBounce => bounce_out(t),
            Self::InBounce => 1.0 - bounce_out(1.0 - t),
            Self::InOutBounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
        }
        .clamp(0.0, 1.0)
    }
}

/// Evaluate the curve named `id` at `t`.
///
/// Unknown identifiers fall back to linear so malformed content keeps playing.
pub fn ease(id: &str, t: f64) -> f64 {
    Easing::from_id(id).unwrap_or_default().apply(t)
}

/// Symmetric in-out curve for `t^power`
fn in_out_power(t: f64, power: i32) -> f64 {
    if t < 0.5 {
        2f64.powi(power - 1) * t.powi(power)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
    }
}

/// Four-segment settling bounce
fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}
