//! Database schema migrations for healthsync.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

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
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!("failed to read schema_version: {}", e);
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: profiles, daily facts with their scores, habits and
/// habit completions.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS profiles (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            username     TEXT NOT NULL UNIQUE,
            coins        INTEGER NOT NULL DEFAULT 0,
            energy_level REAL NOT NULL DEFAULT 50.0
                         CHECK (energy_level >= 0 AND energy_level <= 100),
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_data (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            profile_id      INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            date            TEXT NOT NULL,
            steps           INTEGER NOT NULL DEFAULT 0,
            water_ml        INTEGER NOT NULL DEFAULT 0,
            sleep_hours     REAL,
            breakfast       INTEGER NOT NULL DEFAULT 0,
            lunch           INTEGER NOT NULL DEFAULT 0,
            dinner          INTEGER NOT NULL DEFAULT 0,
            mood            TEXT,
            notes           TEXT,
            activity_score  REAL NOT NULL DEFAULT 0,
            nutrition_score REAL NOT NULL DEFAULT 0,
            recovery_score  REAL NOT NULL DEFAULT 0,
            mental_score    REAL NOT NULL DEFAULT 0,
            overall_balance REAL NOT NULL DEFAULT 0,
            updated_at      TEXT NOT NULL,
            UNIQUE (profile_id, date)
        );

        CREATE TABLE IF NOT EXISTS habits (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            profile_id     INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            name           TEXT NOT NULL,
            target_value   INTEGER,
            unit           TEXT NOT NULL DEFAULT 'times',
            current_streak INTEGER NOT NULL DEFAULT 0,
            longest_streak INTEGER NOT NULL DEFAULT 0,
            is_active      INTEGER NOT NULL DEFAULT 1,
            created_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habit_completions (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id        INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            date            TEXT NOT NULL,
            completed_value INTEGER,
            is_completed    INTEGER NOT NULL DEFAULT 0,
            completed_at    TEXT NOT NULL,
            UNIQUE (habit_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_daily_profile_date ON daily_data(profile_id, date);
        CREATE INDEX IF NOT EXISTS idx_habits_profile ON habits(profile_id);
        CREATE INDEX IF NOT EXISTS idx_completions_habit_date ON habit_completions(habit_id, date);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: achievement unlock bookkeeping.
///
/// One row per (profile, achievement code); the primary key is what keeps
/// each achievement from paying out twice.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS achievement_unlocks (
            profile_id  INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            code        TEXT NOT NULL,
            unlocked_at TEXT NOT NULL,
            PRIMARY KEY (profile_id, code)
        );",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
        for table in [
            "profiles",
            "daily_data",
            "habits",
            "habit_completions",
            "achievement_unlocks",
        ] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn v1_database_upgrades_to_v2() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 1);
        assert!(!table_exists(&conn, "achievement_unlocks"));

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);
        assert!(table_exists(&conn, "achievement_unlocks"));
    }
}
