use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;
use crate::models::{ConversionStatus, JobStatus};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS conversion_jobs (
    identifier TEXT PRIMARY KEY,
    status TEXT NOT NULL DEFAULT 'not_started',
    started_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);
";

pub fn open(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Idempotent lookup-or-create. The insert is a no-op when a record already
/// exists, so concurrent callers for one identifier converge on a single
/// status row and a `running`/`done` job is never reset.
pub fn start_or_find(conn: &Connection, identifier: &str) -> Result<ConversionStatus> {
    conn.execute(
        "INSERT INTO conversion_jobs (identifier) VALUES (?1) ON CONFLICT(identifier) DO NOTHING",
        [identifier],
    )?;
    find(conn, identifier)
}

/// Read-only poll; an unknown identifier yields a synthetic `not_started`
/// record instead of an error.
pub fn find(conn: &Connection, identifier: &str) -> Result<ConversionStatus> {
    let status = conn.query_row(
        "SELECT status FROM conversion_jobs WHERE identifier = ?1",
        [identifier],
        |row| row.get::<_, String>(0),
    );
    match status {
        Ok(value) => Ok(ConversionStatus {
            status: JobStatus::parse(&value),
            job_identifier: identifier.to_string(),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(ConversionStatus {
            status: JobStatus::NotStarted,
            job_identifier: identifier.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Unconditional overwrite; callers only invoke this at phase boundaries.
pub fn set_status(conn: &Connection, identifier: &str, status: JobStatus) -> Result<()> {
    conn.execute(
        "INSERT INTO conversion_jobs (identifier, status) VALUES (?1, ?2) \
         ON CONFLICT(identifier) DO UPDATE SET status = excluded.status, updated_at = datetime('now')",
        rusqlite::params![identifier, status.as_str()],
    )?;
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<(String, JobStatus, String)>> {
    let mut stmt = conn.prepare(
        "SELECT identifier, status, updated_at FROM conversion_jobs ORDER BY started_at DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(identifier, status, updated_at)| (identifier, JobStatus::parse(&status), updated_at))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = open(&dir.path().join("jobs.db")).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_start_or_find_creates_not_started() {
        let (_dir, conn) = test_store();
        let status = start_or_find(&conn, "job-1").unwrap();
        assert_eq!(status.status, JobStatus::NotStarted);
        assert_eq!(status.job_identifier, "job-1");
    }

    #[test]
    fn test_start_or_find_is_idempotent() {
        let (_dir, conn) = test_store();
        let first = start_or_find(&conn, "job-1").unwrap();
        let second = start_or_find(&conn, "job-1").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_start_or_find_does_not_reset_running_job() {
        let (_dir, conn) = test_store();
        start_or_find(&conn, "job-1").unwrap();
        set_status(&conn, "job-1", JobStatus::Running).unwrap();
        let status = start_or_find(&conn, "job-1").unwrap();
        assert_eq!(status.status, JobStatus::Running);
    }

    #[test]
    fn test_set_status_transitions() {
        let (_dir, conn) = test_store();
        start_or_find(&conn, "job-1").unwrap();
        set_status(&conn, "job-1", JobStatus::Running).unwrap();
        set_status(&conn, "job-1", JobStatus::Done).unwrap();
        assert_eq!(find(&conn, "job-1").unwrap().status, JobStatus::Done);
    }

    #[test]
    fn test_find_unknown_identifier_is_synthetic_not_started() {
        let (_dir, conn) = test_store();
        let status = find(&conn, "never-seen").unwrap();
        assert_eq!(status.status, JobStatus::NotStarted);
        // and it did not create a record
        let count: i64 = conn
            .query_row("SELECT count(*) FROM conversion_jobs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_list_orders_jobs() {
        let (_dir, conn) = test_store();
        start_or_find(&conn, "job-a").unwrap();
        start_or_find(&conn, "job-b").unwrap();
        set_status(&conn, "job-b", JobStatus::Errored).unwrap();
        let jobs = list(&conn).unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().any(|(id, status, _)| id == "job-b" && *status == JobStatus::Errored));
    }
}
