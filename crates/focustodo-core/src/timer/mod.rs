mod collaborators;
mod cycle;
mod session;
mod ticker;

pub use collaborators::{
    Collaborators, Notifier, ReportRecorder, SoundKind, StateStore, TaskProgress,
};
pub use cycle::SessionCycle;
pub use session::{CycleConfig, SessionState, SessionType, MAX_SESSION_SECS};
pub use ticker::{IntervalTicker, ManualTicker, Ticker};
