//! Focus session reports
//!
//! Turns per-day completion counts into the summaries shown by
//! `focustodo stats`. Days are UTC calendar days; the caller supplies
//! "today" so reports are reproducible.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Compact summary for today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Focus sessions completed today
    pub today: u32,
    /// Focus sessions completed overall
    pub total: u32,
    /// Overall focus time, rounded to whole hours
    pub total_hours: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    /// The last seven days ending today, oldest first
    pub days: Vec<DayCount>,
    pub total: u32,
    /// Mean sessions per day over the seven days, one decimal
    pub average: f64,
    /// First day with the highest non-zero count
    pub best_day: Option<DayCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayStats {
    pub pomodoros: u32,
    pub focus_hours: f64,
    pub completed_tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_pomodoros: u32,
    pub total_hours: u64,
    /// Mean sessions per day that has any sessions, one decimal
    pub average_daily: f64,
}

/// Full report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusReport {
    pub today: TodayStats,
    pub weekly: WeeklyStats,
    pub overall: OverallStats,
}

/// Builds reports from per-day focus counts.
#[derive(Debug, Clone)]
pub struct FocusStatsAnalyzer {
    /// Length of one focus session, used for today's hours
    pub focus_minutes: u32,
}

impl Default for FocusStatsAnalyzer {
    fn default() -> Self {
        Self { focus_minutes: 25 }
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn hours(minutes: u64) -> u64 {
    (minutes as f64 / 60.0).round() as u64
}

impl FocusStatsAnalyzer {
    pub fn new(focus_minutes: u32) -> Self {
        Self { focus_minutes }
    }

    pub fn daily(
        &self,
        counts: &BTreeMap<NaiveDate, u32>,
        total_minutes: u64,
        today: NaiveDate,
    ) -> DailyStats {
        DailyStats {
            today: counts.get(&today).copied().unwrap_or(0),
            total: counts.values().sum(),
            total_hours: hours(total_minutes),
        }
    }

    pub fn weekly(&self, counts: &BTreeMap<NaiveDate, u32>, today: NaiveDate) -> WeeklyStats {
        let days: Vec<DayCount> = (0..7)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                DayCount {
                    date,
                    count: counts.get(&date).copied().unwrap_or(0),
                }
            })
            .collect();

        let total: u32 = days.iter().map(|d| d.count).sum();
        let best_day = days.iter().fold(None::<DayCount>, |best, day| {
            if day.count > best.map_or(0, |b| b.count) {
                Some(*day)
            } else {
                best
            }
        });

        WeeklyStats {
            average: round1(f64::from(total) / 7.0),
            total,
            best_day,
            days,
        }
    }

    pub fn overall(&self, counts: &BTreeMap<NaiveDate, u32>, total_minutes: u64) -> OverallStats {
        let total: u32 = counts.values().sum();
        let average_daily = if counts.is_empty() {
            0.0
        } else {
            round1(f64::from(total) / counts.len() as f64)
        };
        OverallStats {
            total_pomodoros: total,
            total_hours: hours(total_minutes),
            average_daily,
        }
    }

    pub fn report(
        &self,
        counts: &BTreeMap<NaiveDate, u32>,
        total_minutes: u64,
        completed_tasks_today: u32,
        today: NaiveDate,
    ) -> FocusReport {
        let pomodoros = counts.get(&today).copied().unwrap_or(0);
        FocusReport {
            today: TodayStats {
                pomodoros,
                focus_hours: f64::from(pomodoros) * f64::from(self.focus_minutes) / 60.0,
                completed_tasks: completed_tasks_today,
            },
            weekly: self.weekly(counts, today),
            overall: self.overall(counts, total_minutes),
        }
    }
}
