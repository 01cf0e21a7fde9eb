use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub fn open(db_path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(db_path).context("Failed to open database connection")?;
    conn.busy_timeout(Duration::from_secs(5))
        .context("Failed to set database busy timeout")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            file_path TEXT NOT NULL,
            status TEXT NOT NULL,
            current_stage TEXT,
            progress INTEGER NOT NULL DEFAULT 0,
            transcript TEXT,
            summary TEXT,
            action_items TEXT,
            decisions TEXT,
            participants TEXT,
            duration REAL,
            created_at TEXT NOT NULL,
            completed_at TEXT,
            error TEXT
        )",
        [],
    )
    .context("Failed to create jobs table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at DESC)",
        [],
    )
    .context("Failed to create jobs created_at index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)",
        [],
    )
    .context("Failed to create jobs status index")?;

    Ok(())
}
