//! Database schema migrations for vinea.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration
//! version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current
/// schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// v1: initial schema.
///
/// The ledger is a single-row aggregate; leftover units per evolution
/// stage are derived from the totals, so only the totals are stored.
/// Sessions carry a precomputed `local_date` column so calendar queries
/// (streaks, monthly distinct days) never depend on SQLite timezone math.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS ledger (
            id                      INTEGER PRIMARY KEY CHECK (id = 1),
            berries_today           INTEGER NOT NULL DEFAULT 0,
            berries_lifetime        INTEGER NOT NULL DEFAULT 0,
            bunches_completed       INTEGER NOT NULL DEFAULT 0,
            boxes_completed         INTEGER NOT NULL DEFAULT 0,
            bottles_completed       INTEGER NOT NULL DEFAULT 0,
            crates_completed        INTEGER NOT NULL DEFAULT 0,
            experience              INTEGER NOT NULL DEFAULT 0,
            level                   INTEGER NOT NULL DEFAULT 1,
            consecutive_focus_days  INTEGER NOT NULL DEFAULT 0,
            last_focus_date         TEXT,
            total_focus_secs        INTEGER NOT NULL DEFAULT 0,
            total_tasks_completed   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id            TEXT PRIMARY KEY,
            task_id       TEXT,
            kind          TEXT NOT NULL,
            duration_secs INTEGER NOT NULL,
            started_at    TEXT NOT NULL,
            completed_at  TEXT NOT NULL,
            local_date    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS badges (
            id          TEXT PRIMARY KEY,
            unlocked_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id           TEXT PRIMARY KEY,
            title        TEXT NOT NULL,
            completed    INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL,
            completed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_local_date ON sessions(local_date);
        CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
        CREATE INDEX IF NOT EXISTS idx_sessions_kind_local_date ON sessions(kind, local_date);
        CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);",
    )?;
    set_schema_version(conn, 1)
}
