//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: measurements and patient info
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- MEASUREMENTS
        -- One row per reading, keyed on the UTC instant
        -- ============================================
        CREATE TABLE measurements (
            measured_at TEXT PRIMARY KEY,        -- RFC 3339 UTC: "2022-03-13T16:57:00Z"
            utc_offset INTEGER NOT NULL DEFAULT 0, -- seconds east of UTC at recording time
            systolic INTEGER NOT NULL,           -- mmHg
            diastolic INTEGER NOT NULL,          -- mmHg
            ignored INTEGER NOT NULL DEFAULT 0,  -- boolean

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- PATIENT INFO
        -- Single row, shown in report headers
        -- ============================================
        CREATE TABLE patient_info (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            name TEXT NOT NULL,
            birthdate TEXT NOT NULL,             -- ISO date: "1961-10-22"
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
