//! Statistics module for focustodo
//!
//! Summaries of completed focus sessions: today, the trailing week, and all
//! time.

mod focus_report;

pub use focus_report::{
    DailyStats, DayCount, FocusReport, FocusStatsAnalyzer, OverallStats, TodayStats, WeeklyStats,
};
