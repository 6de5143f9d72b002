//! Application state and command reducer.
//!
//! [`App`] owns everything that changes while the timer is used: the
//! countdown, momentum, focus target, task list, session log and settings.
//! Front ends feed it [`Command`]s through [`App::dispatch`] and get back the
//! [`Event`]s that describe what changed. Nothing here touches a clock,
//! thread or file; time always comes in as an argument.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::{BumpReason, Event};
use crate::momentum::{self, Inference, MomentumTracker, START_BUMP, TASK_BUMP};
use crate::session::{SessionLog, SessionRecord};
use crate::storage::Settings;
use crate::task::{TaskList, TaskSize};
use crate::timer::{Phase, TickOutcome, TimerEngine};

/// Input accepted by [`App::dispatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    /// Start when stopped, pause when running.
    Toggle,
    /// Manual advance to the next phase.
    Advance,
    SetPhase {
        phase: Phase,
        secs: Option<u32>,
    },
    /// Shift the remaining time by `secs` (may be negative).
    Nudge {
        secs: i64,
    },
    SelectPreset {
        minutes: u32,
    },
    /// Pick the preset in hot-key slot `slot` (0-based).
    SelectPresetSlot {
        slot: usize,
    },
    SetMicroBreak {
        enabled: bool,
    },
    SetAutoAdvance {
        enabled: bool,
    },
    SetSound {
        enabled: bool,
    },
    /// Advance the countdown by an explicit delta.
    Tick {
        elapsed_secs: f64,
    },
    /// Advance the countdown to the dispatch time.
    Frame,
    /// A keyboard, mouse or touch event.
    Activity,
    AddTask {
        title: String,
        #[serde(default)]
        size: TaskSize,
    },
    SetTaskDone {
        index: usize,
        done: bool,
    },
    RenameTask {
        index: usize,
        title: String,
    },
    MoveTaskUp {
        index: usize,
    },
    MoveTaskDown {
        index: usize,
    },
    RemoveTask {
        index: usize,
    },
}

/// The part of [`App`] persisted between runs, apart from settings, tasks
/// and the session log which are stored on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub engine: TimerEngine,
    #[serde(default)]
    pub momentum: MomentumTracker,
    pub target_focus_secs: u32,
}

#[derive(Debug, Clone)]
pub struct App {
    settings: Settings,
    engine: TimerEngine,
    momentum: MomentumTracker,
    target_focus_secs: u32,
    tasks: TaskList,
    sessions: SessionLog,
}

impl App {
    /// Fresh state: Hypothesize, stopped, zero momentum.
    pub fn new(settings: Settings) -> Self {
        let target_focus_secs = settings.durations.focus_secs;
        let engine = TimerEngine::new(
            Phase::Hypothesize,
            settings.phase_secs(Phase::Hypothesize, target_focus_secs),
        );
        Self {
            settings,
            engine,
            momentum: MomentumTracker::new(),
            target_focus_secs,
            tasks: TaskList::new(),
            sessions: SessionLog::new(),
        }
    }

    /// Rebuild from independently loaded parts. A missing timer snapshot
    /// starts a fresh cycle.
    pub fn restore(
        settings: Settings,
        timer: Option<TimerSnapshot>,
        tasks: TaskList,
        sessions: SessionLog,
    ) -> Self {
        let mut app = Self::new(settings);
        if let Some(snapshot) = timer {
            app.engine = snapshot.engine;
            app.momentum = snapshot.momentum;
            app.target_focus_secs = snapshot.target_focus_secs;
        }
        app.tasks = tasks;
        app.sessions = sessions;
        app
    }

    pub fn timer_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            engine: self.engine.clone(),
            momentum: self.momentum.clone(),
            target_focus_secs: self.target_focus_secs,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn momentum(&self) -> f64 {
        self.momentum.score()
    }

    pub fn target_focus_secs(&self) -> u32 {
        self.target_focus_secs
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn sessions(&self) -> &SessionLog {
        &self.sessions
    }

    /// Full length of the current phase.
    pub fn phase_total_secs(&self) -> u32 {
        self.settings.phase_secs(self.phase(), self.target_focus_secs)
    }

    /// 0.0 .. 1.0 progress through the current phase.
    pub fn progress(&self) -> f64 {
        self.engine.progress(self.phase_total_secs())
    }

    pub fn inference(&self) -> Inference {
        momentum::infer(
            self.momentum.score(),
            &self.sessions,
            &self.settings.focus_presets,
        )
    }

    /// Focus length the next full cycle would pick right now.
    pub fn infer_next_focus_secs(&self) -> u32 {
        self.inference().focus_secs
    }

    // ── Reducer ──────────────────────────────────────────────────────

    /// Apply one command at time `now`.
    ///
    /// # Errors
    ///
    /// Only task edits and preset picks can fail, when they reference a task
    /// or slot that does not exist or carry an empty title / zero length.
    pub fn dispatch(
        &mut self,
        command: Command,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, ValidationError> {
        let events = match command {
            Command::Start => self.start(now),
            Command::Pause => self.pause(now),
            Command::Toggle => {
                if self.engine.is_running() {
                    self.pause(now)
                } else {
                    self.start(now)
                }
            }
            Command::Advance => self.switch_to_next_phase(now),
            Command::SetPhase { phase, secs } => vec![self.set_phase(phase, secs, now)],
            Command::Nudge { secs } => vec![self.nudge(secs)],
            Command::SelectPreset { minutes } => self.select_focus_preset(minutes, now)?,
            Command::SelectPresetSlot { slot } => {
                let minutes = self.settings.preset_for_slot(slot).ok_or_else(|| {
                    ValidationError::OutOfBounds {
                        collection: "focus_presets".into(),
                        index: slot,
                        len: self.settings.focus_presets.len(),
                    }
                })?;
                self.select_focus_preset(minutes, now)?
            }
            Command::SetMicroBreak { enabled } => {
                self.settings.micro_break.enabled = enabled;
                vec![setting_changed("micro_break.enabled", enabled)]
            }
            Command::SetAutoAdvance { enabled } => {
                self.settings.auto_advance = enabled;
                vec![setting_changed("auto_advance", enabled)]
            }
            Command::SetSound { enabled } => {
                self.settings.sound = enabled;
                vec![setting_changed("sound", enabled)]
            }
            Command::Tick { elapsed_secs } => self.tick(elapsed_secs, now),
            Command::Frame => self.frame(now),
            Command::Activity => self.activity(now),
            Command::AddTask { title, size } => {
                let task = self.tasks.add(&title, size, now)?.clone();
                let index = self.tasks.len() - 1;
                let score = self.momentum.bump(TASK_BUMP);
                vec![
                    Event::TaskAdded { index, task },
                    Event::MomentumBumped {
                        reason: BumpReason::TaskAdded,
                        amount: TASK_BUMP,
                        score,
                    },
                ]
            }
            Command::SetTaskDone { index, done } => {
                let task = self.tasks.set_done(index, done)?.clone();
                vec![Event::TaskUpdated { index, task }]
            }
            Command::RenameTask { index, title } => {
                let task = self.tasks.rename(index, &title)?.clone();
                vec![Event::TaskUpdated { index, task }]
            }
            Command::MoveTaskUp { index } => {
                let to = self.tasks.move_up(index)?;
                vec![Event::TaskMoved { from: index, to }]
            }
            Command::MoveTaskDown { index } => {
                let to = self.tasks.move_down(index)?;
                vec![Event::TaskMoved { from: index, to }]
            }
            Command::RemoveTask { index } => {
                let task = self.tasks.remove(index)?;
                vec![Event::TaskRemoved { task }]
            }
        };
        Ok(events)
    }

    // ── Phase timer ──────────────────────────────────────────────────

    /// Switch to `phase`, resetting the countdown to `custom_secs` or the
    /// phase default. Stops the timer.
    pub fn set_phase(
        &mut self,
        phase: Phase,
        custom_secs: Option<u32>,
        now: DateTime<Utc>,
    ) -> Event {
        let from = self.engine.phase();
        let secs =
            custom_secs.unwrap_or_else(|| self.settings.phase_secs(phase, self.target_focus_secs));
        self.engine.set_phase(phase, secs);
        tracing::debug!(%from, to = %phase, secs, "phase set");
        Event::PhaseChanged {
            from,
            to: phase,
            duration_secs: secs,
            at: now,
        }
    }

    /// Hypothesize -> Focus -> Reflect -> Hypothesize. Closing a cycle
    /// picks the next focus target from momentum.
    pub fn switch_to_next_phase(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let current = self.engine.phase();
        let mut events = Vec::with_capacity(2);

        if current.wraps() {
            let inference = self.inference();
            self.target_focus_secs = inference.focus_secs;
            tracing::info!(
                focus_secs = inference.focus_secs,
                combined = inference.combined,
                "inferred next focus length"
            );
            events.push(Event::FocusTargetInferred {
                focus_secs: inference.focus_secs,
                combined_score: inference.combined,
                preset_index: inference.preset_index,
                at: now,
            });
        }

        events.push(self.set_phase(current.next(), None, now));
        events
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if !self.engine.start(now) {
            tracing::debug!(
                running = self.engine.is_running(),
                remaining = self.engine.time_remaining(),
                "start ignored"
            );
            return Vec::new();
        }
        let score = self.momentum.bump(START_BUMP);
        vec![
            Event::TimerStarted {
                phase: self.engine.phase(),
                remaining_secs: self.engine.time_remaining(),
                at: now,
            },
            Event::MomentumBumped {
                reason: BumpReason::TimerStarted,
                amount: START_BUMP,
                score,
            },
        ]
    }

    /// Flush time elapsed since the last frame, then stop.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.frame(now);
        if self.engine.stop() {
            events.push(Event::TimerPaused {
                phase: self.engine.phase(),
                remaining_secs: self.engine.time_remaining(),
                at: now,
            });
        }
        events
    }

    pub fn nudge(&mut self, secs: i64) -> Event {
        self.engine.nudge(secs as f64);
        Event::RemainingAdjusted {
            delta_secs: secs,
            remaining_secs: self.engine.time_remaining(),
        }
    }

    /// Set the focus target; resets the countdown when already in Focus.
    pub fn select_focus_preset(
        &mut self,
        minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "minutes".into(),
                message: "focus length must be at least one minute".into(),
            });
        }
        let focus_secs = minutes.saturating_mul(60);
        self.target_focus_secs = focus_secs;
        let mut events = vec![Event::FocusTargetSelected {
            focus_secs,
            at: now,
        }];
        if self.engine.phase() == Phase::Focus {
            events.push(self.set_phase(Phase::Focus, Some(focus_secs), now));
        }
        Ok(events)
    }

    /// Advance by the time since the last frame.
    pub fn frame(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let elapsed = self.engine.frame_elapsed(now);
        self.tick(elapsed, now)
    }

    /// Advance the countdown (or a pending micro-break) by `elapsed_secs`.
    pub fn tick(&mut self, elapsed_secs: f64, now: DateTime<Utc>) -> Vec<Event> {
        let before = self.engine.time_remaining();
        match self.engine.tick(elapsed_secs) {
            TickOutcome::Idle | TickOutcome::Counting => Vec::new(),
            TickOutcome::Expired => {
                let overshoot = (elapsed_secs - before).max(0.0);
                self.complete_phase(overshoot, now)
            }
            TickOutcome::MicroBreakEnded => self.end_micro_break(now),
        }
    }

    pub fn activity(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        match self.momentum.record_activity(now, self.engine.phase()) {
            Some(amount) => vec![Event::MomentumBumped {
                reason: BumpReason::Activity,
                amount,
                score: self.momentum.score(),
            }],
            None => Vec::new(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// `overshoot` is how far past zero the last tick went; the record is
    /// stamped with the moment the countdown actually hit zero.
    fn complete_phase(&mut self, overshoot: f64, now: DateTime<Utc>) -> Vec<Event> {
        let phase = self.engine.phase();
        let ended_at = Duration::try_milliseconds((overshoot * 1000.0) as i64)
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(now);
        let record = SessionRecord {
            phase,
            ended_at,
            momentum: self.momentum.score(),
            focus_secs: self.target_focus_secs,
        };
        self.sessions.push(record.clone());
        tracing::info!(%phase, momentum = record.momentum, "phase completed");

        let mut events = vec![Event::PhaseCompleted { record }];
        let pulse = &self.settings.micro_break;

        if phase == Phase::Focus && pulse.enabled && pulse.duration_secs > 0 {
            let duration_secs = pulse.duration_secs;
            self.engine.begin_micro_break(duration_secs, now);
            events.push(Event::MicroBreakStarted {
                duration_secs,
                at: ended_at,
            });
            // Time already spent past zero counts toward the pulse.
            if overshoot > 0.0 && self.engine.tick(overshoot) == TickOutcome::MicroBreakEnded {
                events.extend(self.end_micro_break(now));
            }
        } else if self.settings.auto_advance {
            events.extend(self.switch_to_next_phase(now));
        }
        events
    }

    fn end_micro_break(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = vec![Event::MicroBreakEnded { at: now }];
        if self.settings.auto_advance {
            events.extend(self.switch_to_next_phase(now));
        }
        events
    }
}

fn setting_changed(key: &str, value: bool) -> Event {
    Event::SettingChanged {
        key: key.to_string(),
        value: value.to_string(),
    }
}
