pub mod config;
pub mod insight;
pub mod log;
pub mod run;
pub mod stats;
pub mod task;
pub mod timer;

use std::io::Write;

use chrono::Utc;
use pomoloop_core::{App, Command, Database, Event, Settings, Snapshot};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// App state loaded from disk for one invocation.
pub struct Session {
    pub db: Database,
    pub app: App,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let settings = Settings::load_or_default();
        let db = Database::open()?;
        let app = db.load_app(settings)?;
        Ok(Self { db, app })
    }

    /// Reload the stored state, catch the countdown up to now, apply
    /// `command`, then persist. Other processes' changes since the last call
    /// are picked up rather than overwritten.
    pub fn apply(&mut self, command: Command) -> Result<Vec<Event>, Box<dyn std::error::Error>> {
        let settings = self.app.settings().clone();
        let (app, events) = self.db.apply(settings, command, Utc::now())?;
        self.app = app;
        self.after(&events)?;
        Ok(events)
    }

    fn after(&self, events: &[Event]) -> CliResult {
        if events.iter().any(Event::touches_settings) {
            self.app.settings().save()?;
        }
        if self.app.settings().sound
            && events
                .iter()
                .any(|e| matches!(e, Event::PhaseCompleted { .. }))
        {
            ring_bell();
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Outcome<'a> {
    snapshot: Snapshot,
    events: &'a [Event],
}

/// Print the current snapshot followed by the events that produced it.
pub fn print_outcome(app: &App, events: &[Event]) -> CliResult {
    let outcome = Outcome {
        snapshot: Snapshot::of(app),
        events,
    };
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Terminal bell on stderr so stdout stays JSON.
fn ring_bell() {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(b"\x07");
    let _ = stderr.flush();
}

/// Convert a 1-based position from the command line.
pub fn position(n: usize) -> Result<usize, Box<dyn std::error::Error>> {
    n.checked_sub(1)
        .ok_or_else(|| "positions start at 1".into())
}

/// Parse `on`/`off` style switches.
pub fn parse_switch(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on or off, got '{other}'")),
    }
}
