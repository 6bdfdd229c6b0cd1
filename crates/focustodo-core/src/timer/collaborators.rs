//! Contracts the session cycle calls out to.
//!
//! Every collaborator is borrowed by the cycle for its whole lifetime, so a
//! single value (for instance one [`Database`](crate::storage::Database)) can
//! fill several roles at once.

use serde::{Deserialize, Serialize};

use super::session::SessionState;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundKind {
    Start,
    Finish,
}

/// Survives restarts. Only the timer tuple is stored; `running` is dropped.
pub trait StateStore {
    fn load(&self) -> Result<Option<SessionState>>;
    fn save(&self, state: &SessionState) -> Result<()>;
}

/// Fire-and-forget user notifications.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
    fn play_sound(&self, kind: SoundKind);
}

/// Credits completed focus sessions against the active task.
pub trait TaskProgress {
    /// Id of the task currently marked active, if any.
    fn active_task(&self) -> Option<String>;

    /// Returns whether the task still had capacity for another pomodoro.
    fn credit_progress(&self, task_id: &str) -> bool;
}

/// Usage statistics sink, called once per completed focus session.
pub trait ReportRecorder {
    fn record_completed_focus_session(&self, duration_secs: u32) -> Result<()>;
}

/// The set of collaborators a [`SessionCycle`](super::SessionCycle) is built
/// with.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub store: &'a dyn StateStore,
    pub notifier: &'a dyn Notifier,
    pub tasks: &'a dyn TaskProgress,
    pub reports: &'a dyn ReportRecorder,
}
