//! # Pomoloop Core Library
//!
//! Core logic for Pomoloop, a three-phase focus timer (Hypothesize, Focus,
//! Reflect) that tunes the length of the next focus block from a running
//! engagement score. Every operation is reachable from the standalone CLI;
//! other front ends drive the same [`App`].
//!
//! ## Architecture
//!
//! - **Timer Engine**: a countdown that only moves when the caller passes
//!   elapsed time or the current instant. No threads, no clocks.
//! - **App**: one owned state value; input arrives as [`Command`]s and every
//!   change comes back as [`Event`]s.
//! - **Momentum**: bounded score bumped by starts, new tasks and activity,
//!   mapped onto the focus presets when a cycle wraps.
//! - **Storage**: SQLite for the session log and snapshots, TOML for settings.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: countdown and micro-break state
//! - [`App`]: reducer over timer, momentum, tasks and history
//! - [`Database`]: session log and state persistence
//! - [`Settings`]: user configuration

pub mod app;
pub mod error;
pub mod events;
pub mod momentum;
pub mod session;
pub mod storage;
pub mod task;
pub mod timer;
pub mod view;

pub use app::{App, Command, TimerSnapshot};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{BumpReason, Event};
pub use momentum::{Inference, MomentumTracker};
pub use session::{SessionLog, SessionRecord};
pub use storage::{Database, Settings, Stats};
pub use task::{Task, TaskList, TaskSize};
pub use timer::{Phase, TickOutcome, TimerEngine};
pub use view::{Insight, Snapshot};
