//! SQLite-based persistent storage.
//!
//! Provides durable state for:
//! - The progression ledger (single-row aggregate)
//! - Completed sessions and the statistics derived from them
//! - Unlocked badges
//! - The task register
//! - A key-value store for host state (e.g. a persisted timer engine)
//!
//! The progression update for one focus completion is written through
//! [`Database::commit_focus`] as a single transaction, so a crash can
//! never leave the ledger half-updated.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, DatabaseError};
use crate::progression::{Badge, FocusContext, FocusOutcome, Ledger};
use crate::task::Task;
use crate::timer::SessionKind;

use super::data_dir;

/// A completed session as persisted to the `sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub kind: SessionKind,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Session-derived statistics for one local calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TodayStats {
    pub sessions: u64,
    pub focus_secs: u64,
}

/// SQLite database at `~/.config/vinea/vinea.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database, creating the file and schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("vinea.db");
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database. Used by tests and ephemeral hosts.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        super::migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Ledger ───────────────────────────────────────────────────────

    /// Load the singleton ledger row, creating a default one if missing.
    pub fn load_ledger(&self) -> Result<Ledger, DatabaseError> {
        self.conn
            .execute("INSERT OR IGNORE INTO ledger (id) VALUES (1)", [])?;
        let ledger = self.conn.query_row(
            "SELECT berries_today, berries_lifetime, bunches_completed, boxes_completed,
                    bottles_completed, crates_completed, experience, level,
                    consecutive_focus_days, last_focus_date, total_focus_secs,
                    total_tasks_completed
             FROM ledger WHERE id = 1",
            [],
            |row| {
                Ok(Ledger {
                    berries_today: row.get(0)?,
                    berries_lifetime: row.get(1)?,
                    bunches_completed: row.get(2)?,
                    boxes_completed: row.get(3)?,
                    bottles_completed: row.get(4)?,
                    crates_completed: row.get(5)?,
                    experience: row.get(6)?,
                    level: row.get(7)?,
                    consecutive_focus_days: row.get(8)?,
                    last_focus_date: row.get(9)?,
                    total_focus_secs: row.get(10)?,
                    total_tasks_completed: row.get(11)?,
                })
            },
        )?;
        Ok(ledger)
    }

    /// Persist the ledger as one full-row write.
    ///
    /// A failed save leaves the in-memory ledger authoritative; callers
    /// may retry.
    pub fn save_ledger(&self, ledger: &Ledger) -> Result<(), DatabaseError> {
        write_ledger(&self.conn, ledger)?;
        Ok(())
    }

    /// Apply one completed focus session and persist everything it
    /// touched -- session row, ledger, badge unlocks -- in a single
    /// transaction.
    ///
    /// The in-memory ledger is mutated first; if the transaction fails it
    /// still holds the post-event state and remains authoritative until a
    /// retry succeeds.
    pub fn commit_focus(
        &mut self,
        ledger: &mut Ledger,
        record: &SessionRecord,
        completed_at_local: NaiveDateTime,
    ) -> Result<FocusOutcome, DatabaseError> {
        let local_date = completed_at_local.date();
        let tx = self.conn.transaction()?;

        insert_session(&tx, record, local_date)?;
        let focus_days_this_month = focus_days_in_month_on(&tx, local_date)?;
        let unlocked = unlocked_badge_set_on(&tx)?;

        let outcome = ledger.apply_focus(&FocusContext {
            duration_secs: record.duration_secs,
            completed_at_local,
            focus_days_this_month,
            unlocked: &unlocked,
        });

        write_ledger(&tx, ledger)?;
        for badge in &outcome.new_badges {
            insert_badge(&tx, *badge, record.completed_at)?;
        }

        tx.commit()?;
        Ok(outcome)
    }

    // ── Sessions & statistics ────────────────────────────────────────

    /// Record a completed session outside the focus-progression path
    /// (breaks, imports).
    pub fn append_session(
        &self,
        record: &SessionRecord,
        local_date: NaiveDate,
    ) -> Result<(), DatabaseError> {
        insert_session(&self.conn, record, local_date)?;
        Ok(())
    }

    pub fn list_sessions(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, kind, duration_secs, started_at, completed_at
             FROM sessions
             WHERE completed_at >= ?1
             ORDER BY completed_at DESC",
        )?;
        let rows = stmt.query_map(params![since], row_to_session)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    /// Session-derived stats for one local day.
    pub fn today_stats(&self, today: NaiveDate) -> Result<TodayStats, DatabaseError> {
        let stats = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM sessions
             WHERE kind = 'focus' AND local_date = ?1",
            params![today],
            |row| {
                Ok(TodayStats {
                    sessions: row.get(0)?,
                    focus_secs: row.get(1)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Focus seconds per day over the last 7 local days (days with no
    /// focus are absent).
    pub fn weekly_focus(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<(NaiveDate, u64)>, DatabaseError> {
        let since = today - Duration::days(6);
        let mut stmt = self.conn.prepare(
            "SELECT local_date, SUM(duration_secs)
             FROM sessions
             WHERE kind = 'focus' AND local_date >= ?1
             GROUP BY local_date
             ORDER BY local_date",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, u64>(1)?))
        })?;
        let mut days = Vec::new();
        for row in rows {
            days.push(row?);
        }
        Ok(days)
    }

    /// Focus seconds per task title for one local day, largest first.
    pub fn task_distribution(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<(String, u64)>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.title, SUM(s.duration_secs) AS total_secs
             FROM sessions s
             JOIN tasks t ON s.task_id = t.id
             WHERE s.kind = 'focus' AND s.local_date = ?1
             GROUP BY t.id, t.title
             ORDER BY total_secs DESC",
        )?;
        let rows = stmt.query_map(params![today], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        let mut dist = Vec::new();
        for row in rows {
            dist.push(row?);
        }
        Ok(dist)
    }

    /// Distinct local days with a completed focus session in the calendar
    /// month containing `date`.
    pub fn focus_days_in_month(&self, date: NaiveDate) -> Result<u32, DatabaseError> {
        focus_days_in_month_on(&self.conn, date)
    }

    // ── Badges ───────────────────────────────────────────────────────

    /// All unlocked badges with their unlock timestamps.
    pub fn unlocked_badges(&self) -> Result<Vec<(Badge, DateTime<Utc>)>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, unlocked_at FROM badges ORDER BY unlocked_at")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, DateTime<Utc>>(1)?))
        })?;
        let mut badges = Vec::new();
        for row in rows {
            let (id, at) = row?;
            if let Some(badge) = Badge::from_id(&id) {
                badges.push((badge, at));
            }
        }
        Ok(badges)
    }

    pub fn unlocked_badge_set(&self) -> Result<HashSet<Badge>, DatabaseError> {
        unlocked_badge_set_on(&self.conn)
    }

    /// Persist a badge unlock. At most one row per badge, ever; repeated
    /// calls are no-ops.
    pub fn unlock_badge(&self, badge: Badge, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        insert_badge(&self.conn, badge, at)?;
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn create_task(&self, title: &str) -> Result<Task, DatabaseError> {
        let task = Task::new(title);
        self.conn.execute(
            "INSERT INTO tasks (id, title, completed, created_at) VALUES (?1, ?2, 0, ?3)",
            params![task.id.to_string(), task.title, task.created_at],
        )?;
        Ok(task)
    }

    /// List tasks, optionally filtered by completion status. Newest first.
    pub fn list_tasks(&self, completed: Option<bool>) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, completed, created_at, completed_at
             FROM tasks
             WHERE (?1 IS NULL OR completed = ?1)
             ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![completed], row_to_task)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Mark a task completed and bump the ledger's completed-task count,
    /// in one transaction. Completing an already-completed task is a
    /// no-op.
    pub fn complete_task(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE tasks SET completed = 1, completed_at = ?2 WHERE id = ?1 AND completed = 0",
            params![id.to_string(), Utc::now()],
        )?;
        if changed == 0 {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM tasks WHERE id = ?1",
                    params![id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(DatabaseError::NotFound {
                    entity: "task",
                    id: id.to_string(),
                });
            }
            return Ok(()); // Already completed.
        }
        tx.execute(
            "UPDATE ledger SET total_tasks_completed = total_tasks_completed + 1 WHERE id = 1",
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_task(&self, id: Uuid) -> Result<(), DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "task",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

// ── Shared row operations (plain connection or open transaction) ─────

fn write_ledger(conn: &Connection, ledger: &Ledger) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR REPLACE INTO ledger
            (id, berries_today, berries_lifetime, bunches_completed, boxes_completed,
             bottles_completed, crates_completed, experience, level,
             consecutive_focus_days, last_focus_date, total_focus_secs,
             total_tasks_completed)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            ledger.berries_today,
            ledger.berries_lifetime,
            ledger.bunches_completed,
            ledger.boxes_completed,
            ledger.bottles_completed,
            ledger.crates_completed,
            ledger.experience,
            ledger.level,
            ledger.consecutive_focus_days,
            ledger.last_focus_date,
            ledger.total_focus_secs,
            ledger.total_tasks_completed,
        ],
    )?;
    Ok(())
}

fn insert_session(
    conn: &Connection,
    record: &SessionRecord,
    local_date: NaiveDate,
) -> Result<(), DatabaseError> {
    let kind = match record.kind {
        SessionKind::Focus => "focus",
        SessionKind::Break => "break",
    };
    conn.execute(
        "INSERT INTO sessions (id, task_id, kind, duration_secs, started_at, completed_at, local_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id.to_string(),
            record.task_id.map(|id| id.to_string()),
            kind,
            record.duration_secs,
            record.started_at,
            record.completed_at,
            local_date,
        ],
    )?;
    Ok(())
}

fn insert_badge(conn: &Connection, badge: Badge, at: DateTime<Utc>) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO badges (id, unlocked_at) VALUES (?1, ?2)",
        params![badge.id(), at],
    )?;
    Ok(())
}

fn unlocked_badge_set_on(conn: &Connection) -> Result<HashSet<Badge>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id FROM badges")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut set = HashSet::new();
    for row in rows {
        if let Some(badge) = Badge::from_id(&row?) {
            set.insert(badge);
        }
    }
    Ok(set)
}

fn focus_days_in_month_on(conn: &Connection, date: NaiveDate) -> Result<u32, DatabaseError> {
    let month_prefix = date.format("%Y-%m-").to_string();
    let days = conn.query_row(
        "SELECT COUNT(DISTINCT local_date)
         FROM sessions
         WHERE kind = 'focus' AND local_date LIKE ?1 || '%'",
        params![month_prefix],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(days)
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    let id: String = row.get(0)?;
    let task_id: Option<String> = row.get(1)?;
    let kind: String = row.get(2)?;
    Ok(SessionRecord {
        id: parse_uuid(&id, 0)?,
        task_id: match task_id {
            Some(s) => Some(parse_uuid(&s, 1)?),
            None => None,
        },
        kind: match kind.as_str() {
            "break" => SessionKind::Break,
            _ => SessionKind::Focus,
        },
        duration_secs: row.get(3)?,
        started_at: row.get(4)?,
        completed_at: row.get(5)?,
    })
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    Ok(Task {
        id: parse_uuid(&id, 0)?,
        title: row.get(1)?,
        completed: row.get(2)?,
        created_at: row.get(3)?,
        completed_at: row.get(4)?,
    })
}

fn parse_uuid(s: &str, idx: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: SessionKind) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: Uuid::new_v4(),
            task_id: None,
            kind,
            duration_secs: 25 * 60,
            started_at: now,
            completed_at: now,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ledger_round_trip() {
        let db = Database::open_memory().unwrap();
        let mut ledger = db.load_ledger().unwrap();
        assert_eq!(ledger, Ledger::default());

        ledger.berries_lifetime = 42;
        ledger.bunches_completed = 4;
        ledger.level = 3;
        ledger.last_focus_date = Some(date(2024, 6, 1));
        db.save_ledger(&ledger).unwrap();

        assert_eq!(db.load_ledger().unwrap(), ledger);
    }

    #[test]
    fn commit_focus_persists_everything_atomically() {
        let mut db = Database::open_memory().unwrap();
        let mut ledger = db.load_ledger().unwrap();
        let rec = record(SessionKind::Focus);
        let local = date(2024, 6, 1).and_hms_opt(7, 30, 0).unwrap();

        let outcome = db.commit_focus(&mut ledger, &rec, local).unwrap();
        assert_eq!(
            outcome.new_badges,
            vec![Badge::FirstStep, Badge::EarlyBird]
        );

        // Reload from disk: everything landed.
        let persisted = db.load_ledger().unwrap();
        assert_eq!(persisted, ledger);
        assert_eq!(persisted.berries_lifetime, 1);
        assert_eq!(db.today_stats(date(2024, 6, 1)).unwrap().sessions, 1);
        let unlocked = db.unlocked_badge_set().unwrap();
        assert!(unlocked.contains(&Badge::FirstStep));
        assert!(unlocked.contains(&Badge::EarlyBird));
    }

    #[test]
    fn badge_unlock_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.unlock_badge(Badge::FirstStep, now).unwrap();
        db.unlock_badge(Badge::FirstStep, now + Duration::hours(1))
            .unwrap();
        let badges = db.unlocked_badges().unwrap();
        assert_eq!(badges.len(), 1);
        // First unlock timestamp wins.
        assert_eq!(badges[0].1, now);
    }

    #[test]
    fn focus_days_in_month_counts_distinct_days() {
        let db = Database::open_memory().unwrap();
        db.append_session(&record(SessionKind::Focus), date(2024, 6, 1))
            .unwrap();
        db.append_session(&record(SessionKind::Focus), date(2024, 6, 1))
            .unwrap();
        db.append_session(&record(SessionKind::Focus), date(2024, 6, 2))
            .unwrap();
        // Breaks and other months don't count.
        db.append_session(&record(SessionKind::Break), date(2024, 6, 3))
            .unwrap();
        db.append_session(&record(SessionKind::Focus), date(2024, 7, 1))
            .unwrap();

        assert_eq!(db.focus_days_in_month(date(2024, 6, 15)).unwrap(), 2);
        assert_eq!(db.focus_days_in_month(date(2024, 7, 15)).unwrap(), 1);
    }

    #[test]
    fn task_lifecycle_updates_ledger_count() {
        let mut db = Database::open_memory().unwrap();
        db.load_ledger().unwrap();
        let task = db.create_task("Prune the vines").unwrap();
        assert!(!task.completed);

        db.complete_task(task.id).unwrap();
        // Completing twice does not double-count.
        db.complete_task(task.id).unwrap();
        assert_eq!(db.load_ledger().unwrap().total_tasks_completed, 1);

        let done = db.list_tasks(Some(true)).unwrap();
        assert_eq!(done.len(), 1);
        assert!(done[0].completed_at.is_some());

        db.delete_task(task.id).unwrap();
        assert!(matches!(
            db.delete_task(task.id),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn complete_unknown_task_is_not_found() {
        let mut db = Database::open_memory().unwrap();
        db.load_ledger().unwrap();
        assert!(matches!(
            db.complete_task(Uuid::new_v4()),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn weekly_focus_window() {
        let db = Database::open_memory().unwrap();
        let today = date(2024, 6, 10);
        db.append_session(&record(SessionKind::Focus), today).unwrap();
        db.append_session(&record(SessionKind::Focus), date(2024, 6, 4))
            .unwrap();
        // Outside the 7-day window.
        db.append_session(&record(SessionKind::Focus), date(2024, 6, 3))
            .unwrap();

        let week = db.weekly_focus(today).unwrap();
        assert_eq!(week.len(), 2);
        assert_eq!(week[0].0, date(2024, 6, 4));
        assert_eq!(week[1].0, today);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }
}
