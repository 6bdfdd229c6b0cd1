//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - The session cycle's state (key-value table)
//! - Completed focus sessions, for statistics
//! - To-do tasks and the active task marker
//!
//! `Database` fills the `StateStore`, `TaskProgress` and `ReportRecorder`
//! roles of the session cycle.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{migrations, DATABASE_FILE};
use crate::error::{CoreError, DatabaseError, Result};
use crate::task::{Priority, Task, TaskUpdate};
use crate::timer::{ReportRecorder, SessionState, StateStore, TaskProgress};

/// Key under which the session cycle's state is stored.
pub const TIMER_STATE_KEY: &str = "timer_state";
/// Key under which the active task id is stored.
pub const ACTIVE_TASK_KEY: &str = "active_task";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRecord {
    pub id: i64,
    pub duration_min: u32,
    pub completed_at: DateTime<Utc>,
}

pub struct Database {
    conn: Connection,
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Column `column` holds an RFC 3339 timestamp.
fn parse_datetime(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let priority: String = row.get(4)?;
    let created_at: String = row.get(6)?;
    let completed_at: Option<String> = row.get(7)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        estimated_pomodoros: row.get(2)?,
        completed_pomodoros: row.get(3)?,
        priority: priority.parse().map_err(|e| conversion_error(4, e))?,
        completed: row.get(5)?,
        created_at: parse_datetime(6, &created_at)?,
        completed_at: completed_at
            .as_deref()
            .map(|at| parse_datetime(7, at))
            .transpose()?,
    })
}

const TASK_COLUMNS: &str = "id, title, estimated_pomodoros, completed_pomodoros, priority, completed, created_at, completed_at";

impl Database {
    /// Open the database at `<dir>/focustodo.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_in(dir: &Path) -> Result<Self> {
        Self::open_at(&dir.join(DATABASE_FILE))
    }

    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Focus sessions ───────────────────────────────────────────────

    /// Record a completed focus session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_focus_session(
        &self,
        duration_min: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO focus_sessions (duration_min, completed_at) VALUES (?1, ?2)",
            params![duration_min, completed_at.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent focus sessions first.
    pub fn recent_focus_sessions(&self, limit: usize) -> Result<Vec<FocusRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, duration_min, completed_at FROM focus_sessions
             ORDER BY completed_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let completed_at: String = row.get(2)?;
            Ok(FocusRecord {
                id: row.get(0)?,
                duration_min: row.get(1)?,
                completed_at: parse_datetime(2, &completed_at)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Completed focus sessions per UTC calendar day.
    pub fn daily_focus_counts(&self) -> Result<BTreeMap<NaiveDate, u32>> {
        let mut stmt = self.conn.prepare("SELECT completed_at FROM focus_sessions")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let day = parse_datetime(0, &row?)?.date_naive();
            *counts.entry(day).or_insert(0) += 1;
        }
        Ok(counts)
    }

    pub fn total_focus_minutes(&self) -> Result<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_min), 0) FROM focus_sessions",
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// # Errors
    /// Returns a validation error for an invalid task, or a database error.
    pub fn add_task(&self, task: &Task) -> Result<()> {
        task.validate()?;
        self.conn.execute(
            "INSERT INTO tasks (id, title, estimated_pomodoros, completed_pomodoros, priority, completed, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.id,
                task.title,
                task.estimated_pomodoros,
                task.completed_pomodoros,
                task.priority.as_str(),
                task.completed,
                task.created_at.to_rfc3339(),
                task.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// All tasks in creation order.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map([], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn require_task(&self, id: &str) -> Result<Task> {
        self.get_task(id)?
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
    }

    fn write_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET title = ?2, estimated_pomodoros = ?3, completed_pomodoros = ?4,
                 priority = ?5, completed = ?6, completed_at = ?7
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.estimated_pomodoros,
                task.completed_pomodoros,
                task.priority.as_str(),
                task.completed,
                task.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// # Errors
    /// Returns `TaskNotFound`, a validation error, or a database error.
    pub fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task> {
        let task = self.require_task(id)?;
        let updated = update.apply(&task)?;
        self.write_task(&updated)?;
        Ok(updated)
    }

    /// Returns whether a task was deleted. Clears the active marker if it
    /// pointed at the deleted task.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if deleted > 0 && self.active_task_id()?.as_deref() == Some(id) {
            self.kv_delete(ACTIVE_TASK_KEY)?;
        }
        Ok(deleted > 0)
    }

    pub fn toggle_task_complete(&self, id: &str) -> Result<Task> {
        let mut task = self.require_task(id)?;
        task.toggle_complete();
        self.write_task(&task)?;
        Ok(task)
    }

    /// Mark `id` as the task credited by focus sessions.
    pub fn set_active_task(&self, id: &str) -> Result<()> {
        self.require_task(id)?;
        self.kv_set(ACTIVE_TASK_KEY, id)
    }

    pub fn clear_active_task(&self) -> Result<()> {
        self.kv_delete(ACTIVE_TASK_KEY)
    }

    pub fn active_task_id(&self) -> Result<Option<String>> {
        self.kv_get(ACTIVE_TASK_KEY)
    }

    /// Credit one pomodoro to the task while it is below its estimate.
    ///
    /// Returns `false` when the task is already at its estimate.
    pub fn increment_pomodoro(&self, id: &str) -> Result<bool> {
        let mut task = self.require_task(id)?;
        if !task.credit_pomodoro() {
            return Ok(false);
        }
        self.write_task(&task)?;
        Ok(true)
    }

    /// Tasks marked done on `day` (UTC).
    pub fn completed_tasks_on(&self, day: NaiveDate) -> Result<u32> {
        Ok(self
            .list_tasks()?
            .iter()
            .filter(|t| t.completed && t.completed_at.is_some_and(|at| at.date_naive() == day))
            .count() as u32)
    }
}

impl StateStore for Database {
    fn load(&self) -> Result<Option<SessionState>> {
        match self.kv_get(TIMER_STATE_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv_set(TIMER_STATE_KEY, &json)
    }
}

impl TaskProgress for Database {
    fn active_task(&self) -> Option<String> {
        self.active_task_id().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read active task");
            None
        })
    }

    fn credit_progress(&self, task_id: &str) -> bool {
        self.increment_pomodoro(task_id).unwrap_or_else(|e| {
            warn!(task = %task_id, error = %e, "failed to credit task");
            false
        })
    }
}

impl ReportRecorder for Database {
    fn record_completed_focus_session(&self, duration_secs: u32) -> Result<()> {
        self.record_focus_session(duration_secs / 60, Utc::now())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::notify::LogNotifier;
    use crate::timer::{Collaborators, CycleConfig, SessionCycle, SessionType};

    fn task(title: &str, estimate: u32) -> Task {
        Task::new(title, estimate, Priority::P2).unwrap()
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("hello"));
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn timer_state_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(StateStore::load(&db).unwrap().is_none());
        let state = SessionState {
            session_type: SessionType::LongBreak,
            seconds_remaining: 42,
            completed_focus_sessions: 4,
            running: false,
        };
        db.save(&state).unwrap();
        assert_eq!(StateStore::load(&db).unwrap(), Some(state));
    }

    #[test]
    fn corrupt_timer_state_is_an_error() {
        let db = Database::open_memory().unwrap();
        db.kv_set(TIMER_STATE_KEY, r#"{"sessionType":"nap"}"#).unwrap();
        assert!(StateStore::load(&db).is_err());
        db.kv_set(TIMER_STATE_KEY, "not json").unwrap();
        assert!(StateStore::load(&db).is_err());
    }

    #[test]
    fn saved_state_is_initially_valid() {
        let db = Database::open_memory().unwrap();
        let config = CycleConfig::default();
        db.save(&SessionState::initial(&config)).unwrap();
        let loaded = StateStore::load(&db).unwrap().unwrap();
        assert!(loaded.validate().is_ok());
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Start,
        Pause,
        Tick,
        Complete,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            1 => Just(Op::Start),
            1 => Just(Op::Pause),
            6 => Just(Op::Tick),
            1 => Just(Op::Complete),
        ]
    }

    proptest! {
        #[test]
        fn reachable_states_survive_save_and_load(ops in proptest::collection::vec(op(), 0..120)) {
            let db = Database::open_memory().unwrap();
            let notifier = LogNotifier;
            let config = CycleConfig {
                focus_secs: 5,
                short_break_secs: 2,
                long_break_secs: 3,
                long_break_interval: 4,
            };
            let mut cycle = SessionCycle::new(
                config,
                Collaborators { store: &db, notifier: &notifier, tasks: &db, reports: &db },
            );
            for op in ops {
                match op {
                    Op::Start => { cycle.start(); }
                    Op::Pause => { cycle.pause(); }
                    Op::Tick => { cycle.tick(); }
                    Op::Complete => { cycle.complete(); }
                }
                let state = cycle.state();
                db.save(&state).unwrap();
                let expected = SessionState { running: false, ..state };
                prop_assert_eq!(StateStore::load(&db).unwrap(), Some(expected));
            }
        }
    }

    #[test]
    fn corrupt_task_row_is_an_error() {
        let db = Database::open_memory().unwrap();
        let t = task("Archive", 2);
        db.add_task(&t).unwrap();
        db.conn
            .execute("UPDATE tasks SET priority = 'p9' WHERE id = ?1", params![t.id])
            .unwrap();
        assert!(db.get_task(&t.id).is_err());

        db.conn
            .execute(
                "UPDATE tasks SET priority = 'p1', created_at = 'yesterday' WHERE id = ?1",
                params![t.id],
            )
            .unwrap();
        assert!(db.list_tasks().is_err());
    }

    #[test]
    fn corrupt_session_timestamp_is_an_error() {
        let db = Database::open_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO focus_sessions (duration_min, completed_at) VALUES (25, 'garbage')",
                [],
            )
            .unwrap();
        assert!(db.daily_focus_counts().is_err());
        assert!(db.recent_focus_sessions(5).is_err());
    }

    #[test]
    fn update_cannot_drop_estimate_below_progress() {
        let db = Database::open_memory().unwrap();
        let t = task("Migrate", 3);
        db.add_task(&t).unwrap();
        db.increment_pomodoro(&t.id).unwrap();
        db.increment_pomodoro(&t.id).unwrap();
        let update = TaskUpdate {
            estimated_pomodoros: Some(1),
            ..TaskUpdate::default()
        };
        assert!(matches!(
            db.update_task(&t.id, update),
            Err(CoreError::Validation(_))
        ));
        let stored = db.get_task(&t.id).unwrap().unwrap();
        assert_eq!(stored.estimated_pomodoros, 3);
        assert_eq!(stored.completed_pomodoros, 2);
    }

    #[test]
    fn clearing_active_task_keeps_the_task() {
        let db = Database::open_memory().unwrap();
        let t = task("Review", 1);
        db.add_task(&t).unwrap();
        db.set_active_task(&t.id).unwrap();
        db.clear_active_task().unwrap();
        assert_eq!(db.active_task_id().unwrap(), None);
        assert!(db.get_task(&t.id).unwrap().is_some());
    }

    #[test]
    fn open_in_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        Database::open_in(dir.path()).unwrap();
        assert!(dir.path().join(DATABASE_FILE).exists());
    }

    #[test]
    fn task_crud() {
        let db = Database::open_memory().unwrap();
        let t = task("Write tests", 3);
        db.add_task(&t).unwrap();
        assert_eq!(db.get_task(&t.id).unwrap().unwrap().title, "Write tests");

        let updated = db
            .update_task(
                &t.id,
                TaskUpdate {
                    priority: Some(Priority::P1),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.priority, Priority::P1);

        let toggled = db.toggle_task_complete(&t.id).unwrap();
        assert!(toggled.completed);

        assert!(db.delete_task(&t.id).unwrap());
        assert!(!db.delete_task(&t.id).unwrap());
        assert!(db.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn update_missing_task_is_not_found() {
        let db = Database::open_memory().unwrap();
        let err = db.update_task("nope", TaskUpdate::default()).unwrap_err();
        assert!(matches!(err, CoreError::TaskNotFound(_)));
    }

    #[test]
    fn increment_is_capped_by_estimate() {
        let db = Database::open_memory().unwrap();
        let t = task("Refactor", 1);
        db.add_task(&t).unwrap();
        assert!(db.increment_pomodoro(&t.id).unwrap());
        assert!(!db.increment_pomodoro(&t.id).unwrap());
        assert_eq!(db.get_task(&t.id).unwrap().unwrap().completed_pomodoros, 1);
    }

    #[test]
    fn deleting_active_task_clears_marker() {
        let db = Database::open_memory().unwrap();
        let t = task("Email", 1);
        db.add_task(&t).unwrap();
        db.set_active_task(&t.id).unwrap();
        assert_eq!(db.active_task(), Some(t.id.clone()));
        db.delete_task(&t.id).unwrap();
        assert_eq!(db.active_task(), None);
    }

    #[test]
    fn activating_unknown_task_fails() {
        let db = Database::open_memory().unwrap();
        assert!(db.set_active_task("missing").is_err());
    }

    #[test]
    fn report_recorder_stores_minutes() {
        let db = Database::open_memory().unwrap();
        db.record_completed_focus_session(1500).unwrap();
        db.record_completed_focus_session(1500).unwrap();
        assert_eq!(db.total_focus_minutes().unwrap(), 50);
        let today = Utc::now().date_naive();
        assert_eq!(db.daily_focus_counts().unwrap().get(&today), Some(&2));
        assert_eq!(db.recent_focus_sessions(1).unwrap().len(), 1);
    }
}
