use pomoloop_core::view::log_lines;
use pomoloop_core::Database;

use super::CliResult;

/// Print completed sessions, newest first.
pub fn run(limit: usize, json: bool) -> CliResult {
    let db = Database::open()?;
    let sessions = db.sessions()?;

    if json {
        let newest: Vec<_> = sessions.records().iter().rev().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&newest)?);
        return Ok(());
    }

    let lines = log_lines(&sessions, limit);
    if lines.is_empty() {
        println!("No sessions yet.");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
