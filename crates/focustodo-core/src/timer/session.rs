use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on any session's remaining time, in seconds.
pub const MAX_SESSION_SECS: u32 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn label(self) -> &'static str {
        match self {
            SessionType::Focus => "Focus Time",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, SessionType::Focus)
    }
}

/// Durations and cadence of the session cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    pub focus_secs: u32,
    pub short_break_secs: u32,
    pub long_break_secs: u32,
    /// Every n-th completed focus session is followed by a long break.
    pub long_break_interval: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            long_break_interval: 4,
        }
    }
}

impl CycleConfig {
    pub fn duration_secs(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Focus => self.focus_secs,
            SessionType::ShortBreak => self.short_break_secs,
            SessionType::LongBreak => self.long_break_secs,
        }
    }

    /// Session that follows the `completed`-th focus session.
    ///
    /// The counter is expected to already include the session that just
    /// finished.
    pub fn break_after(&self, completed: u32) -> SessionType {
        if completed % self.long_break_interval.max(1) == 0 {
            SessionType::LongBreak
        } else {
            SessionType::ShortBreak
        }
    }

    /// # Errors
    /// Returns an error if a duration is zero or longer than an hour, or the
    /// long-break interval is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, secs) in [
            ("focus_secs", self.focus_secs),
            ("short_break_secs", self.short_break_secs),
            ("long_break_secs", self.long_break_secs),
        ] {
            if secs == 0 || secs > MAX_SESSION_SECS {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: format!("must be between 1 and {MAX_SESSION_SECS} seconds, got {secs}"),
                });
            }
        }
        if self.long_break_interval == 0 {
            return Err(ValidationError::InvalidValue {
                field: "long_break_interval".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Snapshot of the cycle's mutable state.
///
/// `running` is never persisted: a restored cycle always starts paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_type: SessionType,
    pub seconds_remaining: u32,
    pub completed_focus_sessions: u32,
    #[serde(skip)]
    pub running: bool,
}

impl SessionState {
    /// Focus at full duration, zero counters, paused.
    pub fn initial(config: &CycleConfig) -> Self {
        Self {
            session_type: SessionType::Focus,
            seconds_remaining: config.duration_secs(SessionType::Focus),
            completed_focus_sessions: 0,
            running: false,
        }
    }

    /// Rejects state no cycle could have produced under any configuration.
    ///
    /// # Errors
    /// Returns `InvalidSessionState` when the remaining time exceeds
    /// [`MAX_SESSION_SECS`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.seconds_remaining > MAX_SESSION_SECS {
            return Err(ValidationError::InvalidSessionState {
                reason: format!(
                    "remaining time {}s exceeds {MAX_SESSION_SECS}s",
                    self.seconds_remaining
                ),
            });
        }
        Ok(())
    }

    /// Caps the remaining time at the session's configured duration.
    ///
    /// A state saved under longer durations stays in the same session with
    /// its counter intact.
    pub fn fit_to(self, config: &CycleConfig) -> Self {
        Self {
            seconds_remaining: self
                .seconds_remaining
                .min(config.duration_secs(self.session_type)),
            ..self
        }
    }
}
