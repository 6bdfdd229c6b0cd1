//! # focustodo Core Library
//!
//! Business logic for the focustodo Pomodoro timer and to-do list. The CLI
//! binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Session cycle**: a deterministic focus/break state machine driven by
//!   an injected tick source, with its collaborators passed in explicitly
//! - **Storage**: SQLite for timer state, tasks and completed sessions;
//!   TOML for configuration
//! - **Stats**: daily, weekly and overall focus summaries
//!
//! ## Key Components
//!
//! - [`SessionCycle`]: the timer state machine
//! - [`Database`]: persistence, task progress and session reports
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, TerminalNotifier};
pub use stats::{FocusReport, FocusStatsAnalyzer};
pub use storage::{Config, Database};
pub use task::{Priority, Task, TaskUpdate};
pub use timer::{
    Collaborators, CycleConfig, IntervalTicker, ManualTicker, SessionCycle, SessionState,
    SessionType, SoundKind, Ticker,
};
