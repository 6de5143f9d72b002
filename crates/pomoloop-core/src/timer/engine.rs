//! Countdown engine for a single phase.
//!
//! The engine does not use internal threads. The caller advances it either
//! with an explicit elapsed delta (`tick`) or by handing it the current time
//! (`frame_elapsed`), which measures the delta against the stored anchor.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> Expired -> (MicroBreak) -> next phase
//! ```
//!
//! Phase sequencing, session logging and duration inference live in
//! [`crate::app::App`]; the engine only counts down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Pending micro-break pulse after a Focus phase expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroBreak {
    /// Seconds of pulse still to run.
    pub remaining_secs: f64,
    /// Last frame timestamp seen while pulsing.
    #[serde(default)]
    pub anchor: Option<DateTime<Utc>>,
}

/// What a call to [`TimerEngine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is counting; the tick was ignored.
    Idle,
    /// Time was consumed but nothing finished.
    Counting,
    /// The phase countdown reached zero on this tick.
    Expired,
    /// The micro-break pulse finished on this tick.
    MicroBreakEnded,
}

/// Core countdown state.
///
/// `time_remaining` is never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    phase: Phase,
    /// Remaining seconds in the current phase.
    time_remaining: f64,
    running: bool,
    /// Timestamp of the start or of the last frame while running.
    #[serde(default)]
    anchor: Option<DateTime<Utc>>,
    #[serde(default)]
    micro_break: Option<MicroBreak>,
}

impl TimerEngine {
    /// Create a stopped engine on `phase` with `secs` on the clock.
    pub fn new(phase: Phase, secs: u32) -> Self {
        Self {
            phase,
            time_remaining: f64::from(secs),
            running: false,
            anchor: None,
            micro_break: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn anchor(&self) -> Option<DateTime<Utc>> {
        self.anchor
    }

    pub fn is_expired(&self) -> bool {
        self.time_remaining <= 0.0
    }

    pub fn micro_break(&self) -> Option<&MicroBreak> {
        self.micro_break.as_ref()
    }

    /// 0.0 .. 1.0 progress within the current phase, given its full length.
    pub fn progress(&self, total_secs: u32) -> f64 {
        if total_secs == 0 {
            return 0.0;
        }
        (1.0 - self.time_remaining / f64::from(total_secs)).clamp(0.0, 1.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Switch to `phase` with a fresh countdown. Stops the timer and drops
    /// any pending micro-break.
    pub fn set_phase(&mut self, phase: Phase, secs: u32) {
        self.phase = phase;
        self.time_remaining = f64::from(secs);
        self.running = false;
        self.anchor = None;
        self.micro_break = None;
    }

    /// Returns `false` when the engine is already running, pulsing a
    /// micro-break, or sitting at zero.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.running || self.micro_break.is_some() || self.is_expired() {
            return false;
        }
        self.running = true;
        self.anchor = Some(now);
        true
    }

    /// Returns `false` when there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.anchor = None;
        true
    }

    /// Shift the remaining time by `delta_secs`, flooring at zero.
    pub fn nudge(&mut self, delta_secs: f64) {
        self.time_remaining = (self.time_remaining + delta_secs).max(0.0);
    }

    /// Start the post-Focus pulse.
    pub fn begin_micro_break(&mut self, duration_secs: u32, now: DateTime<Utc>) {
        self.micro_break = Some(MicroBreak {
            remaining_secs: f64::from(duration_secs),
            anchor: Some(now),
        });
    }

    /// Consume `elapsed_secs`. Negative deltas count as zero.
    pub fn tick(&mut self, elapsed_secs: f64) -> TickOutcome {
        let elapsed = elapsed_secs.max(0.0);

        if let Some(pulse) = self.micro_break.as_mut() {
            pulse.remaining_secs -= elapsed;
            if pulse.remaining_secs <= 0.0 {
                self.micro_break = None;
                return TickOutcome::MicroBreakEnded;
            }
            return TickOutcome::Counting;
        }

        if !self.running {
            return TickOutcome::Idle;
        }

        self.time_remaining -= elapsed;
        if self.time_remaining <= 0.0 {
            self.time_remaining = 0.0;
            self.running = false;
            self.anchor = None;
            return TickOutcome::Expired;
        }
        TickOutcome::Counting
    }

    /// Seconds since the last frame, re-anchoring at `now`.
    ///
    /// The first frame after a start without an anchor measures zero.
    pub fn frame_elapsed(&mut self, now: DateTime<Utc>) -> f64 {
        let slot = match self.micro_break.as_mut() {
            Some(pulse) => &mut pulse.anchor,
            None if self.running => &mut self.anchor,
            None => return 0.0,
        };
        let elapsed = slot
            .map(|last| (now - last).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);
        *slot = Some(now);
        elapsed.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn set_phase_resets_and_stops() {
        let mut engine = TimerEngine::new(Phase::Hypothesize, 120);
        engine.start(at(0));
        engine.tick(10.0);
        engine.set_phase(Phase::Reflect, 90);
        assert_eq!(engine.phase(), Phase::Reflect);
        assert_eq!(engine.time_remaining(), 90.0);
        assert!(!engine.is_running());
        assert!(engine.anchor().is_none());
    }

    #[test]
    fn start_is_refused_twice_and_at_zero() {
        let mut engine = TimerEngine::new(Phase::Focus, 60);
        assert!(engine.start(at(0)));
        assert!(!engine.start(at(1)));

        let mut expired = TimerEngine::new(Phase::Focus, 0);
        assert!(!expired.start(at(0)));
    }

    #[test]
    fn tick_only_counts_while_running() {
        let mut engine = TimerEngine::new(Phase::Focus, 60);
        assert_eq!(engine.tick(5.0), TickOutcome::Idle);
        assert_eq!(engine.time_remaining(), 60.0);

        engine.start(at(0));
        assert_eq!(engine.tick(5.0), TickOutcome::Counting);
        assert_eq!(engine.time_remaining(), 55.0);
    }

    #[test]
    fn tick_clamps_at_zero_and_stops() {
        let mut engine = TimerEngine::new(Phase::Focus, 60);
        engine.set_phase(Phase::Focus, 0);
        engine.nudge(0.5);
        engine.start(at(0));
        assert_eq!(engine.tick(1.0), TickOutcome::Expired);
        assert_eq!(engine.time_remaining(), 0.0);
        assert!(!engine.is_running());
    }

    #[test]
    fn negative_elapsed_is_ignored() {
        let mut engine = TimerEngine::new(Phase::Focus, 60);
        engine.start(at(0));
        engine.tick(-30.0);
        assert_eq!(engine.time_remaining(), 60.0);
    }

    #[test]
    fn nudge_floors_at_zero() {
        let mut engine = TimerEngine::new(Phase::Reflect, 30);
        engine.nudge(-60.0);
        assert_eq!(engine.time_remaining(), 0.0);
        engine.nudge(60.0);
        assert_eq!(engine.time_remaining(), 60.0);
    }

    #[test]
    fn micro_break_counts_down_then_ends() {
        let mut engine = TimerEngine::new(Phase::Focus, 1);
        engine.start(at(0));
        assert_eq!(engine.tick(2.0), TickOutcome::Expired);
        engine.begin_micro_break(20, at(2));
        assert!(!engine.start(at(3)));
        assert_eq!(engine.tick(10.0), TickOutcome::Counting);
        assert_eq!(engine.tick(10.0), TickOutcome::MicroBreakEnded);
        assert!(engine.micro_break().is_none());
    }

    #[test]
    fn frame_elapsed_measures_from_anchor() {
        let mut engine = TimerEngine::new(Phase::Focus, 600);
        assert_eq!(engine.frame_elapsed(at(5)), 0.0);

        engine.start(at(0));
        let dt = engine.frame_elapsed(at(0) + Duration::milliseconds(1500));
        assert!((dt - 1.5).abs() < 1e-9);
        assert_eq!(engine.anchor(), Some(at(0) + Duration::milliseconds(1500)));
    }

    #[test]
    fn progress_is_clamped() {
        let mut engine = TimerEngine::new(Phase::Reflect, 90);
        assert_eq!(engine.progress(90), 0.0);
        engine.nudge(90.0);
        assert_eq!(engine.progress(90), 0.0);
        engine.set_phase(Phase::Reflect, 45);
        assert!((engine.progress(90) - 0.5).abs() < 1e-9);
        assert_eq!(engine.progress(0), 0.0);
    }

    #[test]
    fn serde_roundtrip_keeps_anchor() {
        let mut engine = TimerEngine::new(Phase::Focus, 600);
        engine.start(at(0));
        let json = serde_json::to_string(&engine).unwrap();
        let back: TimerEngine = serde_json::from_str(&json).unwrap();
        assert!(back.is_running());
        assert_eq!(back.anchor(), Some(at(0)));
    }
}
