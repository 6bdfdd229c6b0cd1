//! Session cycle state machine.
//!
//! The cycle alternates focus and break sessions. It does not own a thread or
//! read the clock: something else calls `tick()` once per elapsed second,
//! either directly or through [`SessionCycle::run`] with a [`Ticker`].
//!
//! ## Transitions
//!
//! ```text
//! Focus --complete--> ShortBreak --complete--> Focus
//!       \-- every 4th --> LongBreak --complete--> Focus
//! ```
//!
//! Every mutation is written to the [`StateStore`]. Collaborator failures are
//! logged and never abort a transition; an invalid state resets the cycle.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::collaborators::{Collaborators, SoundKind};
use super::session::{CycleConfig, SessionState, SessionType};
use super::ticker::Ticker;
use crate::events::Event;

pub struct SessionCycle<'a> {
    config: CycleConfig,
    state: SessionState,
    collaborators: Collaborators<'a>,
}

impl<'a> SessionCycle<'a> {
    /// Fresh cycle: Focus at full duration, zero counters, paused.
    pub fn new(config: CycleConfig, collaborators: Collaborators<'a>) -> Self {
        Self {
            state: SessionState::initial(&config),
            config,
            collaborators,
        }
    }

    /// Adopt `state` as-is. It is checked on the next `start()`.
    pub fn restore(
        config: CycleConfig,
        collaborators: Collaborators<'a>,
        state: SessionState,
    ) -> Self {
        Self {
            config,
            state,
            collaborators,
        }
    }

    /// Restore from the store, falling back to a reset on corrupt state.
    ///
    /// A saved session longer than its configured duration (the config was
    /// shortened since) is capped rather than reset.
    pub fn load(config: CycleConfig, collaborators: Collaborators<'a>) -> Self {
        let mut cycle = Self::new(config, collaborators);
        match collaborators.store.load() {
            Ok(Some(saved)) => match saved.validate() {
                Ok(()) => {
                    cycle.state = SessionState {
                        running: false,
                        ..saved.fit_to(&config)
                    };
                    debug!(
                        session = ?saved.session_type,
                        remaining = saved.seconds_remaining,
                        "restored session state"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "persisted session state is corrupt, resetting");
                    cycle.reset();
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to load session state, resetting");
                cycle.reset();
            }
        }
        cycle
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_type(&self) -> SessionType {
        self.state.session_type
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.state.seconds_remaining
    }

    pub fn completed_focus_sessions(&self) -> u32 {
        self.state.completed_focus_sessions
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn total_secs(&self) -> u32 {
        self.config.duration_secs(self.state.session_type)
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        (1.0 - f64::from(self.state.seconds_remaining) / f64::from(total)).clamp(0.0, 1.0)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            session_type: self.state.session_type,
            label: self.state.session_type.label().to_string(),
            seconds_remaining: self.state.seconds_remaining,
            total_secs: self.total_secs(),
            progress: self.progress(),
            completed_focus_sessions: self.state.completed_focus_sessions,
            running: self.state.running,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down. A no-op while already running.
    ///
    /// An out-of-range state resets the cycle instead of starting it; the
    /// returned event is then `CycleReset`.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.running {
            return None;
        }
        if let Err(e) = self.state.validate() {
            warn!(error = %e, "refusing to start, resetting cycle");
            return self.reset();
        }
        self.state = self.state.fit_to(&self.config);
        self.state.running = true;
        self.collaborators.notifier.play_sound(SoundKind::Start);
        self.persist();
        info!(
            session = ?self.state.session_type,
            remaining = self.state.seconds_remaining,
            "session started"
        );
        Some(Event::SessionStarted {
            session_type: self.state.session_type,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Stop counting down, keeping the remaining time. A no-op while paused.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.running = false;
        self.persist();
        info!(remaining = self.state.seconds_remaining, "session paused");
        Some(Event::SessionPaused {
            session_type: self.state.session_type,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Advance by one elapsed second.
    ///
    /// Returns `Some(Event::SessionCompleted)` when the countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        if self.state.seconds_remaining > 0 {
            self.state.seconds_remaining -= 1;
            if self.state.seconds_remaining > 0 {
                self.persist();
                return None;
            }
        }
        Some(self.complete())
    }

    /// Finish the current session and move to the next one, paused.
    ///
    /// Called by `tick()` at zero, or directly to force completion.
    pub fn complete(&mut self) -> Event {
        self.state.running = false;
        let completed = self.state.session_type;
        let mut task_credited = None;

        let next = match completed {
            SessionType::Focus => {
                let tasks = self.collaborators.tasks;
                if let Some(task_id) = tasks.active_task() {
                    let credited = tasks.credit_progress(&task_id);
                    debug!(task = %task_id, credited, "credited focus session to task");
                    task_credited = Some(credited);
                }
                self.state.completed_focus_sessions =
                    self.state.completed_focus_sessions.saturating_add(1);
                let next = self.config.break_after(self.state.completed_focus_sessions);
                if let Err(e) = self
                    .collaborators
                    .reports
                    .record_completed_focus_session(self.config.focus_secs)
                {
                    warn!(error = %e, "failed to record completed focus session");
                }
                next
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Focus,
        };

        self.state.session_type = next;
        self.state.seconds_remaining = self.config.duration_secs(next);

        let body = if next.is_break() {
            "Time for a break!"
        } else {
            "Time to focus!"
        };
        self.collaborators.notifier.notify("Session Complete", body);
        self.collaborators.notifier.play_sound(SoundKind::Finish);
        self.persist();

        info!(
            ?completed,
            ?next,
            completed_focus_sessions = self.state.completed_focus_sessions,
            "session completed"
        );
        Event::SessionCompleted {
            completed,
            next,
            completed_focus_sessions: self.state.completed_focus_sessions,
            task_credited,
            at: Utc::now(),
        }
    }

    /// Back to Focus at full duration with the counter cleared.
    pub fn reset(&mut self) -> Option<Event> {
        self.state = SessionState::initial(&self.config);
        self.persist();
        info!("session cycle reset");
        Some(Event::CycleReset { at: Utc::now() })
    }

    /// Drive `tick()` from `ticker` until the current session completes.
    ///
    /// Starts the cycle if it is paused. When the ticker stops first the cycle
    /// is paused and the pause event returned. If `start()` had to reset an
    /// invalid state, the reset event is returned without ticking.
    pub fn run(&mut self, ticker: &mut dyn Ticker) -> Option<Event> {
        if !self.state.running {
            match self.start() {
                Some(event @ Event::SessionStarted { .. }) => debug!(?event, "run started"),
                other => return other,
            }
        }
        while ticker.wait_tick() {
            if let Some(event) = self.tick() {
                return Some(event);
            }
        }
        self.pause()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&self) {
        if let Err(e) = self.collaborators.store.save(&self.state) {
            warn!(error = %e, "failed to persist session state");
        }
    }
}
