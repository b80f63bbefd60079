// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback engine for `StageCue`.
//!
//! This crate drives scripted, time-addressed actions against a host canvas:
//! - Timelines of scenes of actions
//! - Easing curves for action progress
//! - A tick-driven playback state machine
//! - Per-tick dispatch to host executors
//!
//! ## Architecture
//!
//! The engine is built on:
//! - Plain data model with no playback side effects
//! - [`Scheduler`] owning the timeline and all playback state
//! - [`Dispatcher`] mapping action kinds to executors
//! - [`TickSource`] abstraction over the host's frame clock
//!
//! The engine only decides *when* an action runs and *how far along* it is;
//! what the action does is up to the executor registered for its kind.

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod easing;
pub mod engine;
pub mod error;
pub mod executor;
pub mod model;
pub mod scheduler;
pub mod tick;

pub use config::{ActionBoundsPolicy, EngineConfig};
pub use context::ExecutionContext;
pub use dispatcher::{action_progress, ActionProgress, DispatchReport, Dispatcher};
pub use easing::{ease, Easing};
pub use engine::{Engine, TickReport};
pub use error::{ExecutorError, Result, TimelineError};
pub use executor::{ActionExecutor, ExecutorRegistry};
pub use model::{Action, ActionId, ActionKind, Scene, SceneId, Timeline};
pub use scheduler::{PlaybackEvent, PlaybackState, PlaybackStatus, Scheduler, TickOutcome};
pub use tick::{FrameClock, ManualTickSource, TickSource};
