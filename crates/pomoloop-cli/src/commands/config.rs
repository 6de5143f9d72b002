use clap::Subcommand;
use pomoloop_core::{Command, Settings};

use super::{parse_switch, print_outcome, CliResult, Session};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "durations.focus_secs", "micro_break.enabled")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Turn the post-focus micro-break on or off
    MicroBreak {
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
        state: bool,
    },
    /// Turn automatic phase advance on or off
    AutoAdvance {
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
        state: bool,
    },
    /// Turn the completion bell on or off
    Sound {
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
        state: bool,
    },
}

pub fn run(action: ConfigAction) -> CliResult {
    let command = match action {
        ConfigAction::Get { key } => {
            let config = Settings::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
            return Ok(());
        }
        ConfigAction::Set { key, value } => {
            let mut config = Settings::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
            return Ok(());
        }
        ConfigAction::List => {
            let config = Settings::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        ConfigAction::Reset => {
            Settings::default().save()?;
            println!("config reset to defaults");
            return Ok(());
        }
        ConfigAction::MicroBreak { state } => Command::SetMicroBreak { enabled: state },
        ConfigAction::AutoAdvance { state } => Command::SetAutoAdvance { enabled: state },
        ConfigAction::Sound { state } => Command::SetSound { enabled: state },
    };

    let mut session = Session::open()?;
    let events = session.apply(command)?;
    print_outcome(&session.app, &events)
}
