//! To-do items tracked alongside the session cycle.
//!
//! Each task carries an estimate in pomodoros. Completing a focus session
//! while a task is active credits one pomodoro to it, up to the estimate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Largest estimate a task may carry.
pub const MAX_ESTIMATED_POMODOROS: u32 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    P1,
    #[default]
    P2,
    P3,
    P4,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P1 => "p1",
            Priority::P2 => "p2",
            Priority::P3 => "p3",
            Priority::P4 => "p4",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p1" => Ok(Priority::P1),
            "p2" => Ok(Priority::P2),
            "p3" => Ok(Priority::P3),
            "p4" => Ok(Priority::P4),
            _ => Err(ValidationError::InvalidTask(vec!["Invalid priority level".into()])),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub estimated_pomodoros: u32,
    pub completed_pomodoros: u32,
    pub priority: Priority,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build and validate a new task.
    ///
    /// # Errors
    /// Returns every validation failure at once.
    pub fn new(
        title: impl Into<String>,
        estimated_pomodoros: u32,
        priority: Priority,
    ) -> Result<Self, ValidationError> {
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into().trim().to_string(),
            estimated_pomodoros,
            completed_pomodoros: 0,
            priority,
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
        };
        task.validate()?;
        Ok(task)
    }

    /// # Errors
    /// Returns `InvalidTask` listing each violated rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("Task title is required".to_string());
        }
        if !(1..=MAX_ESTIMATED_POMODOROS).contains(&self.estimated_pomodoros) {
            errors.push(format!(
                "Estimated pomodoros must be between 1 and {MAX_ESTIMATED_POMODOROS}"
            ));
        }
        if self.completed_pomodoros > self.estimated_pomodoros {
            errors.push("Completed pomodoros cannot exceed the estimate".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::InvalidTask(errors))
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.completed_pomodoros < self.estimated_pomodoros
    }

    /// Credit one pomodoro. Returns `false` once the estimate is reached.
    pub fn credit_pomodoro(&mut self) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.completed_pomodoros += 1;
        true
    }

    /// Flip the done flag, stamping or clearing the completion time.
    pub fn toggle_complete(&mut self) {
        self.completed = !self.completed;
        self.completed_at = self.completed.then(Utc::now);
    }

    /// 0.0 .. 1.0 share of the estimate already completed.
    pub fn completion_percentage(&self) -> f64 {
        if self.estimated_pomodoros == 0 {
            0.0
        } else {
            (f64::from(self.completed_pomodoros) / f64::from(self.estimated_pomodoros)).min(1.0)
        }
    }
}

/// Fields a task update may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub estimated_pomodoros: Option<u32>,
    pub priority: Option<Priority>,
}

impl TaskUpdate {
    /// Apply to `task` and re-validate the result.
    ///
    /// # Errors
    /// Returns the validation failures of the updated task; `task` is left
    /// unchanged in that case.
    pub fn apply(self, task: &Task) -> Result<Task, ValidationError> {
        let mut updated = task.clone();
        if let Some(title) = self.title {
            updated.title = title.trim().to_string();
        }
        if let Some(estimate) = self.estimated_pomodoros {
            updated.estimated_pomodoros = estimate;
        }
        if let Some(priority) = self.priority {
            updated.priority = priority;
        }
        updated.validate()?;
        Ok(updated)
    }
}
