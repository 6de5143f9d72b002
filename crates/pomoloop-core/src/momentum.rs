//! Momentum estimator.
//!
//! Momentum is a single engagement score moved by small, bounded nudges:
//! starting the timer, adding a task, and the cadence of keyboard/mouse
//! activity during Focus. Together with the momentum snapshots stored in the
//! session log it decides how long the next focus block should be.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionLog;
use crate::timer::Phase;

pub const MOMENTUM_MIN: f64 = -2.0;
pub const MOMENTUM_MAX: f64 = 4.0;

/// Bump applied when the timer starts.
pub const START_BUMP: f64 = 0.5;
/// Bump applied when a task is created.
pub const TASK_BUMP: f64 = 0.1;
/// Bump for activity arriving quickly after the previous one.
pub const ACTIVE_BUMP: f64 = 0.05;
/// Bump for activity after a pause.
pub const IDLE_BUMP: f64 = -0.02;
/// Activity gaps shorter than this count as sustained input.
pub const ACTIVITY_GAP_SECS: f64 = 3.0;

/// Number of recent sessions blended into the inference.
pub const HISTORY_WINDOW: usize = 6;
const LIVE_WEIGHT: f64 = 0.6;
const HISTORY_WEIGHT: f64 = 0.4;

/// Focus presets in minutes used when none are configured.
pub const DEFAULT_FOCUS_PRESETS: [u32; 4] = [7, 14, 21, 28];

pub fn clamp_momentum(value: f64) -> f64 {
    value.clamp(MOMENTUM_MIN, MOMENTUM_MAX)
}

/// Live momentum plus the time of the last user activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentumTracker {
    score: f64,
    #[serde(default)]
    last_activity: Option<DateTime<Utc>>,
}

impl MomentumTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: f64) -> Self {
        Self {
            score: clamp_momentum(score),
            last_activity: None,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    /// Add `amount` and clamp into range. Returns the new score.
    pub fn bump(&mut self, amount: f64) -> f64 {
        self.score = clamp_momentum(self.score + amount);
        self.score
    }

    /// Register a keyboard/mouse/touch event at `now`.
    ///
    /// Only moves the score during Focus; the timestamp is always updated.
    /// With no previous activity the gap counts as long: the timestamp is
    /// never seeded at load, so a fresh tracker's first Focus event is always
    /// an idle bump. Returns the bump that was applied, if any.
    pub fn record_activity(&mut self, now: DateTime<Utc>, phase: Phase) -> Option<f64> {
        let gap_secs = self
            .last_activity
            .map(|prev| (now - prev).num_milliseconds() as f64 / 1000.0);
        self.last_activity = Some(now);

        if phase != Phase::Focus {
            return None;
        }
        let amount = match gap_secs {
            Some(gap) if gap < ACTIVITY_GAP_SECS => ACTIVE_BUMP,
            _ => IDLE_BUMP,
        };
        self.bump(amount);
        Some(amount)
    }
}

/// Result of a duration inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inference {
    /// Weighted blend of live and historical momentum.
    pub combined: f64,
    /// Index into the preset list that was picked.
    pub preset_index: usize,
    pub focus_secs: u32,
}

/// Blend live momentum with the mean of the last [`HISTORY_WINDOW`] sessions.
pub fn combined_score(current: f64, history: &SessionLog) -> f64 {
    let hist = history.mean_momentum(HISTORY_WINDOW).unwrap_or(0.0);
    LIVE_WEIGHT * clamp_momentum(current) + HISTORY_WEIGHT * clamp_momentum(hist)
}

/// Map a combined score onto a preset list and return the pick.
///
/// An empty preset list falls back to [`DEFAULT_FOCUS_PRESETS`].
pub fn infer(current: f64, history: &SessionLog, presets: &[u32]) -> Inference {
    let presets = if presets.is_empty() {
        &DEFAULT_FOCUS_PRESETS[..]
    } else {
        presets
    };
    let combined = combined_score(current, history);
    let last = (presets.len() - 1) as f64;
    let mapped = map_range(combined, MOMENTUM_MIN, MOMENTUM_MAX, 0.0, last);
    let preset_index = mapped.round().clamp(0.0, last) as usize;

    Inference {
        combined,
        preset_index,
        focus_secs: presets[preset_index].saturating_mul(60),
    }
}

/// Suggested length of the next focus block, in seconds.
pub fn infer_next_focus_secs(current: f64, history: &SessionLog, presets: &[u32]) -> u32 {
    infer(current, history, presets).focus_secs
}

fn map_range(v: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    out_min + (out_max - out_min) * (v - in_min) / (in_max - in_min)
}
