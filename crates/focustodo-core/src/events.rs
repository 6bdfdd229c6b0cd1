use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionType;

/// Every transition of the session cycle produces an Event.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_type: SessionType,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session_type: SessionType,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        completed: SessionType,
        next: SessionType,
        completed_focus_sessions: u32,
        /// Whether the active task accepted another pomodoro.
        /// `None` when no task was active or a break finished.
        task_credited: Option<bool>,
        at: DateTime<Utc>,
    },
    CycleReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_type: SessionType,
        label: String,
        seconds_remaining: u32,
        total_secs: u32,
        /// 0.0 .. 1.0 progress within the current session.
        progress: f64,
        completed_focus_sessions: u32,
        running: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::SessionCompleted { .. })
    }
}
