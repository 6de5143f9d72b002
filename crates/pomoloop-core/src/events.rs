use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;
use crate::task::Task;
use crate::timer::Phase;

/// Why momentum moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpReason {
    TimerStarted,
    TaskAdded,
    Activity,
}

/// Every state change in the system produces an Event.
/// Front ends render from them; storage appends session records from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    /// The countdown ran out on its own.
    PhaseCompleted {
        record: SessionRecord,
    },
    MicroBreakStarted {
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    MicroBreakEnded {
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// A full cycle closed and the next focus length was picked from momentum.
    FocusTargetInferred {
        focus_secs: u32,
        combined_score: f64,
        preset_index: usize,
        at: DateTime<Utc>,
    },
    /// The user picked a focus length.
    FocusTargetSelected {
        focus_secs: u32,
        at: DateTime<Utc>,
    },
    MomentumBumped {
        reason: BumpReason,
        amount: f64,
        score: f64,
    },
    RemainingAdjusted {
        delta_secs: i64,
        remaining_secs: f64,
    },
    SettingChanged {
        key: String,
        value: String,
    },
    TaskAdded {
        index: usize,
        task: Task,
    },
    TaskUpdated {
        index: usize,
        task: Task,
    },
    TaskMoved {
        from: usize,
        to: usize,
    },
    TaskRemoved {
        task: Task,
    },
}

impl Event {
    /// Session record carried by a completion event.
    pub fn session_record(&self) -> Option<&SessionRecord> {
        match self {
            Event::PhaseCompleted { record } => Some(record),
            _ => None,
        }
    }

    /// True for events that change settings and need the config file saved.
    pub fn touches_settings(&self) -> bool {
        matches!(self, Event::SettingChanged { .. })
    }

    /// True for events that change the task list.
    pub fn touches_tasks(&self) -> bool {
        matches!(
            self,
            Event::TaskAdded { .. }
                | Event::TaskUpdated { .. }
                | Event::TaskMoved { .. }
                | Event::TaskRemoved { .. }
        )
    }
}
