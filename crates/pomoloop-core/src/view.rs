//! Read-only renderings of [`App`] state for front ends.

use std::fmt;

use chrono::Local;
use serde::Serialize;

use crate::app::App;
use crate::session::SessionLog;
use crate::timer::Phase;

/// Sessions averaged for the insight panel.
pub const INSIGHT_WINDOW: usize = 5;
/// Default number of log lines shown.
pub const LOG_LIMIT: usize = 10;

/// Render seconds as `MM:SS`. Fractions round to the nearest second and
/// negative input shows as `00:00`. Minutes are not wrapped at 99.
pub fn format_clock(secs: f64) -> String {
    let total = if secs.is_finite() {
        secs.round().max(0.0) as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// What a display needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub remaining_secs: f64,
    pub clock: String,
    pub progress: f64,
    pub running: bool,
    pub target_focus_secs: u32,
    pub momentum: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub micro_break_remaining_secs: Option<f64>,
}

impl Snapshot {
    pub fn of(app: &App) -> Self {
        let engine = app.engine();
        Self {
            phase: engine.phase(),
            remaining_secs: engine.time_remaining(),
            clock: format_clock(engine.time_remaining()),
            progress: app.progress(),
            running: engine.is_running(),
            target_focus_secs: app.target_focus_secs(),
            momentum: app.momentum(),
            micro_break_remaining_secs: engine.micro_break().map(|mb| mb.remaining_secs),
        }
    }
}

/// Short summary of recent momentum, the next focus length and what to work
/// on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub average_momentum: Option<f64>,
    pub next_focus_min: u32,
    pub suggested_task: Option<String>,
}

impl Insight {
    pub fn of(app: &App) -> Self {
        let next_secs = app.infer_next_focus_secs();
        Self {
            average_momentum: app.sessions().mean_momentum(INSIGHT_WINDOW),
            next_focus_min: (f64::from(next_secs) / 60.0).round() as u32,
            suggested_task: app
                .tasks()
                .first_open()
                .map(|t| format!("{} ({})", t.title, t.size)),
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.average_momentum {
            Some(avg) => writeln!(f, "Momentum avg: {avg:.2}")?,
            None => writeln!(f, "Momentum avg: n/a")?,
        }
        writeln!(f, "Next focus: {} min", self.next_focus_min)?;
        match &self.suggested_task {
            Some(task) => write!(f, "Try: {task}"),
            None => write!(f, "Add a task to focus on"),
        }
    }
}

/// Session log lines, newest first, at most `limit` of them.
pub fn log_lines(sessions: &SessionLog, limit: usize) -> Vec<String> {
    sessions
        .records()
        .iter()
        .rev()
        .take(limit)
        .map(|r| {
            format!(
                "{} · {} · momentum {:.2}",
                r.ended_at.with_timezone(&Local).format("%H:%M"),
                r.phase,
                r.momentum
            )
        })
        .collect()
}
