use chrono::Utc;
use clap::Subcommand;
use pomoloop_core::Database;

use super::CliResult;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
}

pub fn run(action: StatsAction) -> CliResult {
    let db = Database::open()?;

    let stats = match action {
        StatsAction::Today => db.stats_today(Utc::now())?,
        StatsAction::All => db.stats_all()?,
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
