//! Task list commands for CLI.

use clap::Subcommand;
use pomoloop_core::{Command, TaskSize};

use super::{position, CliResult, Session};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the end of the list
    Add {
        /// Task title
        title: String,
        /// Effort estimate: s, m or l (default: m)
        #[arg(long, default_value = "m")]
        size: TaskSize,
    },
    /// List tasks
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task done
    Done {
        /// Position in the list, starting at 1
        n: usize,
    },
    /// Mark a task not done
    Undone { n: usize },
    /// Rename a task
    Rename { n: usize, title: String },
    /// Move a task one place up
    Up { n: usize },
    /// Move a task one place down
    Down { n: usize },
    /// Remove a task
    Rm { n: usize },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut session = Session::open()?;

    let command = match action {
        TaskAction::List { json } => {
            let tasks = session.app.tasks();
            if json {
                println!("{}", serde_json::to_string_pretty(tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for (i, task) in tasks.iter().enumerate() {
                    let mark = if task.done { "x" } else { " " };
                    println!("{:>2}. [{mark}] {} ({})", i + 1, task.title, task.size);
                }
            }
            return Ok(());
        }
        TaskAction::Add { title, size } => Command::AddTask { title, size },
        TaskAction::Done { n } => Command::SetTaskDone {
            index: position(n)?,
            done: true,
        },
        TaskAction::Undone { n } => Command::SetTaskDone {
            index: position(n)?,
            done: false,
        },
        TaskAction::Rename { n, title } => Command::RenameTask {
            index: position(n)?,
            title,
        },
        TaskAction::Up { n } => Command::MoveTaskUp {
            index: position(n)?,
        },
        TaskAction::Down { n } => Command::MoveTaskDown {
            index: position(n)?,
        },
        TaskAction::Rm { n } => Command::RemoveTask {
            index: position(n)?,
        },
    };

    let events = session.apply(command)?;
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
