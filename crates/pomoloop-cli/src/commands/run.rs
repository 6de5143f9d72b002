//! Foreground countdown loop.
//!
//! Starts the timer if needed and frames it until the phase (and any
//! micro-break after it) is over. Interrupting the process leaves the timer
//! running; a later `timer status` or `run` catches up from the stored anchor.
//! Each frame reloads stored state, so commands issued from another terminal
//! while the loop runs (activity, pause, task edits) take effect.

use std::io::Write;
use std::thread;
use std::time::Duration;

use pomoloop_core::view::format_clock;
use pomoloop_core::{Command, Event};

use super::{CliResult, Session};

pub fn run(frame_ms: u64) -> CliResult {
    let mut session = Session::open()?;
    let frame = Duration::from_millis(frame_ms.max(10));

    if !active(&session) {
        session.apply(Command::Start)?;
    }
    if !active(&session) {
        return Err("timer cannot start: the countdown has run out".into());
    }

    let mut stdout = std::io::stdout();
    loop {
        let events = session.apply(Command::Frame)?;
        for event in &events {
            report(event);
        }

        let engine = session.app.engine();
        let line = match engine.micro_break() {
            Some(mb) => format!("micro-break {}", format_clock(mb.remaining_secs)),
            None => format!("{} {}", engine.phase(), format_clock(engine.time_remaining())),
        };
        write!(stdout, "\r{line:<24}")?;
        stdout.flush()?;

        if !engine.is_running() && engine.micro_break().is_none() {
            writeln!(stdout)?;
            break;
        }
        thread::sleep(frame);
    }
    Ok(())
}

/// Counting down or pulsing.
fn active(session: &Session) -> bool {
    let engine = session.app.engine();
    engine.is_running() || engine.micro_break().is_some()
}

fn report(event: &Event) {
    match event {
        Event::PhaseCompleted { record } => {
            tracing::info!(phase = %record.phase, momentum = record.momentum, "phase complete");
        }
        Event::FocusTargetInferred { focus_secs, .. } => {
            tracing::info!(minutes = focus_secs / 60, "next focus length");
        }
        other => tracing::debug!(?other, "event"),
    }
}
