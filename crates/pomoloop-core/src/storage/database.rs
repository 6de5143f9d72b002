//! SQLite-based persistence.
//!
//! Provides persistent storage for:
//! - The append-only session log
//! - Session statistics (daily and all-time)
//! - Key-value store for the timer snapshot and the task list
//!
//! Each piece loads on its own; anything unreadable is dropped in favor of
//! defaults and logged, never reported as an error.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations, Settings};
use crate::app::{App, Command, TimerSnapshot};
use crate::error::{DatabaseError, Result};
use crate::events::Event;
use crate::session::{SessionLog, SessionRecord};
use crate::task::TaskList;
use crate::timer::Phase;

/// kv key holding the [`TimerSnapshot`].
pub const TIMER_KEY: &str = "timer";
/// kv key holding the [`TaskList`].
pub const TASKS_KEY: &str = "tasks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub hypothesize_sessions: u64,
    pub focus_sessions: u64,
    pub reflect_sessions: u64,
    /// Focus target minutes summed over completed Focus sessions.
    pub focus_min: u64,
}

/// SQLite database for session and state storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/pomoloop.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("pomoloop.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Session log ──────────────────────────────────────────────────

    /// Append a session record. Records are never updated or deleted.
    pub fn append_session(&self, record: &SessionRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (phase, ended_at, momentum, focus_secs)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.phase.as_str(),
                timestamp(record.ended_at),
                record.momentum,
                record.focus_secs,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The whole session log, oldest first. Unreadable rows are skipped.
    pub fn sessions(&self) -> Result<SessionLog> {
        let mut stmt = self.conn.prepare(
            "SELECT id, phase, ended_at, momentum, focus_secs FROM sessions ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, u32>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, phase, ended_at, momentum, focus_secs) = match row {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable session row");
                    continue;
                }
            };
            let phase = match phase.parse::<Phase>() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(id, error = %e, "skipping session row");
                    continue;
                }
            };
            let ended_at = match DateTime::parse_from_rfc3339(&ended_at) {
                Ok(t) => t.with_timezone(&Utc),
                Err(e) => {
                    tracing::warn!(id, error = %e, "skipping session row with bad timestamp");
                    continue;
                }
            };
            records.push(SessionRecord {
                phase,
                ended_at,
                momentum,
                focus_secs,
            });
        }
        Ok(SessionLog::from_records(records))
    }

    /// Stats for sessions that ended on the UTC day of `now`.
    pub fn stats_today(&self, now: DateTime<Utc>) -> Result<Stats> {
        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(now);
        self.stats_since(Some(day_start))
    }

    pub fn stats_all(&self) -> Result<Stats> {
        self.stats_since(None)
    }

    fn stats_since(&self, since: Option<DateTime<Utc>>) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT phase, COUNT(*), COALESCE(SUM(focus_secs), 0)
             FROM sessions
             WHERE ?1 IS NULL OR ended_at >= ?1
             GROUP BY phase",
        )?;

        let mut stats = Stats::default();
        let rows = stmt.query_map(params![since.map(timestamp)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        for row in rows {
            let (phase, count, focus_secs) = row?;
            let count = count.max(0) as u64;
            let focus_secs = focus_secs.max(0) as u64;
            match phase.parse::<Phase>() {
                Ok(Phase::Hypothesize) => stats.hypothesize_sessions += count,
                Ok(Phase::Focus) => {
                    stats.focus_sessions += count;
                    stats.focus_min += focus_secs / 60;
                }
                Ok(Phase::Reflect) => stats.reflect_sessions += count,
                Err(_) => continue,
            }
            stats.total_sessions += count;
        }
        Ok(stats)
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Decode a JSON value from the kv store. Missing or malformed values
    /// yield `None`; malformed ones are logged.
    pub fn kv_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.kv_get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding malformed stored value");
                Ok(None)
            }
        }
    }

    pub fn kv_set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.kv_set(key, &serde_json::to_string(value)?)
    }

    // ── App state ────────────────────────────────────────────────────

    /// Rebuild the app from stored timer state, tasks and sessions.
    pub fn load_app(&self, settings: Settings) -> Result<App> {
        let timer = self.kv_get_json::<TimerSnapshot>(TIMER_KEY)?;
        let tasks = self
            .kv_get_json::<TaskList>(TASKS_KEY)?
            .unwrap_or_default();
        let sessions = self.sessions()?;
        Ok(App::restore(settings, timer, tasks, sessions))
    }

    /// Store the timer snapshot, the task list when it changed, and append
    /// the session records carried by `events`.
    pub fn save_app(&self, app: &App, events: &[Event]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.write_app(app, events)?;
        tx.commit()?;
        Ok(())
    }

    /// Load the stored app, catch it up to `now`, apply `command` and save,
    /// all in one transaction.
    ///
    /// Every caller sharing the database goes through here, so changes made
    /// by another process between two calls are never overwritten by a stale
    /// in-memory copy.
    ///
    /// # Errors
    /// Returns `CoreError::Validation` when the command is rejected; nothing
    /// is written in that case.
    pub fn apply(
        &self,
        settings: Settings,
        command: Command,
        now: DateTime<Utc>,
    ) -> Result<(App, Vec<Event>)> {
        let tx = self.conn.unchecked_transaction()?;
        let mut app = self.load_app(settings)?;
        let mut events = app.dispatch(Command::Frame, now)?;
        if command != Command::Frame {
            events.extend(app.dispatch(command, now)?);
        }
        self.write_app(&app, &events)?;
        tx.commit()?;
        Ok((app, events))
    }

    fn write_app(&self, app: &App, events: &[Event]) -> Result<()> {
        for record in events.iter().filter_map(Event::session_record) {
            self.append_session(record)?;
        }
        self.kv_set_json(TIMER_KEY, &app.timer_snapshot())?;
        if events.iter().any(Event::touches_tasks) {
            self.kv_set_json(TASKS_KEY, app.tasks())?;
        }
        Ok(())
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn record(phase: Phase, ended_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            phase,
            ended_at,
            momentum: 1.25,
            focus_secs: 840,
        }
    }

    #[test]
    fn append_and_read_back_in_order() {
        let db = Database::open_memory().unwrap();
        db.append_session(&record(Phase::Focus, at(0))).unwrap();
        db.append_session(&record(Phase::Reflect, at(60))).unwrap();
        let log = db.sessions().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0], record(Phase::Focus, at(0)));
        assert_eq!(log.records()[1].phase, Phase::Reflect);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let db = Database::open_memory().unwrap();
        db.append_session(&record(Phase::Focus, at(0))).unwrap();
        db.conn()
            .execute(
                "INSERT INTO sessions (phase, ended_at, momentum, focus_secs)
                 VALUES ('Break', '2024-01-01T00:00:00Z', 0, 0),
                        ('Focus', 'yesterday', 0, 0)",
                [],
            )
            .unwrap();
        assert_eq!(db.sessions().unwrap().len(), 1);
    }

    #[test]
    fn stats_count_phases_and_focus_minutes() {
        let db = Database::open_memory().unwrap();
        db.append_session(&record(Phase::Hypothesize, at(0))).unwrap();
        db.append_session(&record(Phase::Focus, at(100))).unwrap();
        db.append_session(&record(Phase::Focus, at(200))).unwrap();
        db.append_session(&record(Phase::Reflect, at(300))).unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 4);
        assert_eq!(stats.focus_sessions, 2);
        assert_eq!(stats.focus_min, 28);
        assert_eq!(stats.hypothesize_sessions, 1);
        assert_eq!(stats.reflect_sessions, 1);
    }

    #[test]
    fn stats_today_excludes_earlier_days() {
        let db = Database::open_memory().unwrap();
        let now = at(0);
        db.append_session(&record(Phase::Focus, now - chrono::Duration::days(2)))
            .unwrap();
        db.append_session(&record(Phase::Focus, now)).unwrap();
        assert_eq!(db.stats_today(now).unwrap().focus_sessions, 1);
        assert_eq!(db.stats_all().unwrap().focus_sessions, 2);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        let db = Database::open_memory().unwrap();
        db.kv_set(TASKS_KEY, "{not json").unwrap();
        db.kv_set(TIMER_KEY, "[1,2,3]").unwrap();
        let app = db.load_app(Settings::default()).unwrap();
        assert!(app.tasks().is_empty());
        assert_eq!(app.phase(), Phase::Hypothesize);
        assert_eq!(app.engine().time_remaining(), 120.0);
    }

    #[test]
    fn save_and_load_app() {
        let db = Database::open_memory().unwrap();
        let mut app = App::new(Settings::default());
        let mut events = app
            .dispatch(
                Command::AddTask {
                    title: "review PR".into(),
                    size: Default::default(),
                },
                at(0),
            )
            .unwrap();
        events.extend(app.dispatch(Command::Start, at(0)).unwrap());
        events.extend(app.dispatch(Command::Tick { elapsed_secs: 121.0 }, at(121)).unwrap());
        db.save_app(&app, &events).unwrap();

        let loaded = db.load_app(Settings::default()).unwrap();
        assert_eq!(loaded.tasks().len(), 1);
        assert_eq!(loaded.sessions().len(), 1);
        assert_eq!(loaded.sessions().records()[0].phase, Phase::Hypothesize);
        assert_eq!(loaded.phase(), Phase::Focus);
        assert!((loaded.momentum() - app.momentum()).abs() < 1e-9);
    }

    #[test]
    fn activity_between_frames_reaches_the_record() {
        let db = Database::open_memory().unwrap();
        let settings = Settings::default;
        db.apply(
            settings(),
            Command::SetPhase {
                phase: Phase::Focus,
                secs: Some(60),
            },
            at(0),
        )
        .unwrap();
        db.apply(settings(), Command::Start, at(0)).unwrap();

        // A second front end feeds activity while the first one keeps framing.
        for i in 0..10 {
            db.apply(settings(), Command::Activity, at(1 + i)).unwrap();
            db.apply(settings(), Command::Frame, at(1 + i)).unwrap();
        }
        let (app, _) = db.apply(settings(), Command::Frame, at(30)).unwrap();
        let expected = 0.5 - 0.02 + 9.0 * 0.05;
        assert!((app.momentum() - expected).abs() < 1e-9);

        let (_, events) = db.apply(settings(), Command::Frame, at(61)).unwrap();
        let record = events.iter().find_map(Event::session_record).unwrap();
        assert!((record.momentum - expected).abs() < 1e-9);
        assert_eq!(record.ended_at, at(60));

        let stored = db.load_app(settings()).unwrap();
        assert!((stored.momentum() - expected).abs() < 1e-9);
        assert_eq!(stored.sessions().len(), 1);
    }

    #[test]
    fn frame_is_not_counted_twice_across_loads() {
        let db = Database::open_memory().unwrap();
        db.apply(Settings::default(), Command::Start, at(0)).unwrap();
        db.apply(Settings::default(), Command::Frame, at(30)).unwrap();
        let (app, _) = db.apply(Settings::default(), Command::Frame, at(40)).unwrap();
        assert!((app.engine().time_remaining() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn rejected_command_writes_nothing() {
        let db = Database::open_memory().unwrap();
        db.apply(Settings::default(), Command::Start, at(0)).unwrap();
        let err = db
            .apply(Settings::default(), Command::RemoveTask { index: 3 }, at(30))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfBounds { index: 3, .. })
        ));

        // The catch-up frame was rolled back with the command.
        let app = db.load_app(Settings::default()).unwrap();
        assert_eq!(app.engine().time_remaining(), 120.0);
        assert!(app.engine().is_running());
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pomoloop.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.append_session(&record(Phase::Focus, at(0))).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.sessions().unwrap().len(), 1);
    }
}
