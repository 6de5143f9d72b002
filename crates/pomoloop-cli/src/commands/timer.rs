use clap::Subcommand;
use pomoloop_core::{Command, Phase};

use super::{print_outcome, CliResult, Session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start when paused, pause when running
    Toggle,
    /// Skip to the next phase without recording a session
    Next,
    /// Print current timer state as JSON
    Status,
    /// Register user activity (feeds momentum)
    Activity,
    /// Add or remove seconds from the countdown
    Nudge {
        /// Seconds to add; negative to remove
        #[arg(allow_hyphen_values = true)]
        secs: i64,
    },
    /// Set the focus length in minutes
    Preset {
        minutes: u32,
    },
    /// Pick one of the configured focus presets
    Slot {
        /// Preset slot, 1-4
        #[arg(value_parser = clap::value_parser!(u8).range(1..=4))]
        slot: u8,
    },
    /// Advance the countdown by a number of seconds
    Tick {
        #[arg(value_parser = finite_secs)]
        secs: f64,
    },
    /// Jump to a phase (hypothesize, focus, reflect)
    SetPhase {
        phase: Phase,
        /// Countdown length instead of the configured one
        #[arg(long)]
        secs: Option<u32>,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    let mut session = Session::open()?;

    let command = match action {
        TimerAction::Start => Command::Start,
        TimerAction::Pause => Command::Pause,
        TimerAction::Toggle => Command::Toggle,
        TimerAction::Next => Command::Advance,
        TimerAction::Status => Command::Frame,
        TimerAction::Activity => Command::Activity,
        TimerAction::Nudge { secs } => Command::Nudge { secs },
        TimerAction::Preset { minutes } => Command::SelectPreset { minutes },
        TimerAction::Slot { slot } => Command::SelectPresetSlot {
            slot: usize::from(slot) - 1,
        },
        TimerAction::Tick { secs } => Command::Tick { elapsed_secs: secs },
        TimerAction::SetPhase { phase, secs } => Command::SetPhase { phase, secs },
    };

    let events = session.apply(command)?;
    print_outcome(&session.app, &events)
}

fn finite_secs(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if secs.is_finite() {
        Ok(secs)
    } else {
        Err(format!("expected a finite number of seconds, got '{s}'"))
    }
}
