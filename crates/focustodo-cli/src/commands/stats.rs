use std::path::Path;

use chrono::Utc;
use clap::Subcommand;
use focustodo_core::{Config, Database, FocusStatsAnalyzer};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's count alongside overall totals
    Today,
    /// The last seven days
    Week,
    /// Full report: today, this week and all time
    All,
    /// Most recent completed focus sessions
    Recent {
        /// How many sessions to show
        #[arg(long, short = 'n', default_value = "10")]
        limit: usize,
    },
}

pub fn run(action: StatsAction, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_in(dir)?;
    let db = Database::open_in(dir)?;
    let analyzer = FocusStatsAnalyzer::new(config.schedule.focus_duration);

    let counts = db.daily_focus_counts()?;
    let today = Utc::now().date_naive();

    let json = match action {
        StatsAction::Today => {
            let stats = analyzer.daily(&counts, db.total_focus_minutes()?, today);
            serde_json::to_string_pretty(&stats)?
        }
        StatsAction::Week => serde_json::to_string_pretty(&analyzer.weekly(&counts, today))?,
        StatsAction::All => {
            let report = analyzer.report(
                &counts,
                db.total_focus_minutes()?,
                db.completed_tasks_on(today)?,
                today,
            );
            serde_json::to_string_pretty(&report)?
        }
        StatsAction::Recent { limit } => {
            serde_json::to_string_pretty(&db.recent_focus_sessions(limit)?)?
        }
    };
    println!("{json}");
    Ok(())
}
