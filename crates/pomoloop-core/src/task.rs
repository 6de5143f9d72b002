//! Task list shown next to the timer.
//!
//! Tasks are addressed by their position in the list, which is also the
//! order the user sees. The first task that is not done is what the insight
//! panel suggests working on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// Rough effort estimate attached to a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSize {
    #[serde(rename = "S")]
    Small,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
}

impl fmt::Display for TaskSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskSize::Small => "S",
            TaskSize::Medium => "M",
            TaskSize::Large => "L",
        };
        f.write_str(s)
    }
}

impl FromStr for TaskSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "small" => Ok(TaskSize::Small),
            "m" | "medium" => Ok(TaskSize::Medium),
            "l" | "large" => Ok(TaskSize::Large),
            other => Err(ValidationError::InvalidValue {
                field: "size".into(),
                message: format!("expected S, M or L, got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub size: TaskSize,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

/// Ordered list of tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    /// First task that is not done yet.
    pub fn first_open(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| !t.done)
    }

    /// Append a task. The title is trimmed and must not be empty.
    pub fn add(
        &mut self,
        title: &str,
        size: TaskSize,
        now: DateTime<Utc>,
    ) -> Result<&Task, ValidationError> {
        let title = clean_title(title)?;
        self.tasks.push(Task {
            id: Uuid::new_v4().to_string(),
            title,
            size,
            done: false,
            created_at: now,
        });
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn set_done(&mut self, index: usize, done: bool) -> Result<&Task, ValidationError> {
        let task = self.get_mut(index)?;
        task.done = done;
        Ok(&*task)
    }

    pub fn rename(&mut self, index: usize, title: &str) -> Result<&Task, ValidationError> {
        let title = clean_title(title)?;
        let task = self.get_mut(index)?;
        task.title = title;
        Ok(&*task)
    }

    /// Swap with the previous task. No-op for the first task.
    pub fn move_up(&mut self, index: usize) -> Result<usize, ValidationError> {
        self.check(index)?;
        if index == 0 {
            return Ok(index);
        }
        self.tasks.swap(index - 1, index);
        Ok(index - 1)
    }

    /// Swap with the next task. No-op for the last task.
    pub fn move_down(&mut self, index: usize) -> Result<usize, ValidationError> {
        self.check(index)?;
        if index + 1 >= self.tasks.len() {
            return Ok(index);
        }
        self.tasks.swap(index, index + 1);
        Ok(index + 1)
    }

    pub fn remove(&mut self, index: usize) -> Result<Task, ValidationError> {
        self.check(index)?;
        Ok(self.tasks.remove(index))
    }

    fn check(&self, index: usize) -> Result<(), ValidationError> {
        if index < self.tasks.len() {
            Ok(())
        } else {
            Err(ValidationError::OutOfBounds {
                collection: "tasks".into(),
                index,
                len: self.tasks.len(),
            })
        }
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Task, ValidationError> {
        self.check(index)?;
        Ok(&mut self.tasks[index])
    }
}

fn clean_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "title".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(title.to_string())
}
