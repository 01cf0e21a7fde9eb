//! Job record persistence.
//!
//! CRUD operations for the `jobs` table. Raw SQL with rusqlite, no ORM.
//! Every mutation rewrites the full row.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use crate::job::{Job, JobStatus};

const JOB_COLUMNS: &str = "id, filename, file_path, status, current_stage, progress, transcript, \
     summary, action_items, decisions, participants, duration, created_at, completed_at, error";

impl ToSql for JobStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for JobStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        JobStatus::parse(s).ok_or_else(|| FromSqlError::Other(format!("Unknown job status '{}'", s).into()))
    }
}

/// Repository for job records.
pub struct JobRepository;

impl JobRepository {
    /// Insert a new job. Returns `false` without writing if the id is taken.
    pub fn insert(conn: &Connection, job: &Job) -> Result<bool> {
        let row = Self::row_params(job)?;
        let changed = conn
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO jobs ({}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    JOB_COLUMNS
                ),
                &row.as_params()[..],
            )
            .context("Failed to insert job")?;

        Ok(changed == 1)
    }

    /// Upsert every field of the job.
    ///
    /// Returns `false` without writing if the stored row is already terminal.
    pub fn save(conn: &Connection, job: &Job) -> Result<bool> {
        let row = Self::row_params(job)?;
        let changed = conn
            .execute(
                &format!(
                    "INSERT INTO jobs ({}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15) \
                     ON CONFLICT(id) DO UPDATE SET \
                     filename = excluded.filename, file_path = excluded.file_path, \
                     status = excluded.status, current_stage = excluded.current_stage, \
                     progress = excluded.progress, transcript = excluded.transcript, \
                     summary = excluded.summary, action_items = excluded.action_items, \
                     decisions = excluded.decisions, participants = excluded.participants, \
                     duration = excluded.duration, created_at = excluded.created_at, \
                     completed_at = excluded.completed_at, error = excluded.error \
                     WHERE jobs.status NOT IN ('completed', 'failed')",
                    JOB_COLUMNS
                ),
                &row.as_params()[..],
            )
            .context("Failed to save job")?;

        Ok(changed == 1)
    }

    /// Get a job by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Job>> {
        conn.query_row(
            &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
            params![id],
            Self::from_row,
        )
        .optional()
        .context("Failed to query job")
    }

    /// List jobs, newest first.
    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<Job>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM jobs ORDER BY created_at DESC, id DESC LIMIT ?1",
                JOB_COLUMNS
            ))
            .context("Failed to prepare jobs list query")?;

        let jobs = stmt
            .query_map(params![limit as i64], Self::from_row)
            .context("Failed to list jobs")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map jobs")?;

        Ok(jobs)
    }

    /// Mark every job that never reached a terminal state as failed.
    pub fn fail_interrupted(conn: &Connection, error: &str) -> Result<usize> {
        let updated = conn
            .execute(
                "UPDATE jobs SET status = ?1, current_stage = ?2, error = ?3 \
                 WHERE status NOT IN ('completed', 'failed')",
                params![
                    JobStatus::Failed,
                    JobStatus::Failed.stage_label(),
                    error
                ],
            )
            .context("Failed to mark interrupted jobs as failed")?;

        Ok(updated)
    }

    fn row_params(job: &Job) -> Result<JobRow> {
        Ok(JobRow {
            id: job.id.clone(),
            filename: job.filename.clone(),
            file_path: job.file_path.clone(),
            status: job.status,
            current_stage: job.current_stage.clone(),
            progress: i64::from(job.progress),
            transcript: job.transcript.clone(),
            summary: job.summary.clone(),
            action_items: serde_json::to_string(&job.action_items)?,
            decisions: serde_json::to_string(&job.decisions)?,
            participants: serde_json::to_string(&job.participants)?,
            duration: job.duration,
            created_at: store_timestamp(&job.created_at),
            completed_at: job.completed_at.as_ref().map(store_timestamp),
            error: job.error.clone(),
        })
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
        let progress: i64 = row.get(5)?;
        Ok(Job {
            id: row.get(0)?,
            filename: row.get(1)?,
            file_path: row.get(2)?,
            status: row.get(3)?,
            current_stage: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            progress: progress.clamp(0, 100) as u8,
            transcript: row.get(6)?,
            summary: row.get(7)?,
            action_items: json_column(row, 8)?,
            decisions: json_column(row, 9)?,
            participants: json_column(row, 10)?,
            duration: row.get(11)?,
            created_at: timestamp_column(row, 12)?,
            completed_at: row
                .get::<_, Option<String>>(13)?
                .map(|s| parse_timestamp(13, &s))
                .transpose()?,
            error: row.get(14)?,
        })
    }
}

/// Owned column values in `JOB_COLUMNS` order.
struct JobRow {
    id: String,
    filename: String,
    file_path: String,
    status: JobStatus,
    current_stage: String,
    progress: i64,
    transcript: Option<String>,
    summary: Option<String>,
    action_items: String,
    decisions: String,
    participants: String,
    duration: Option<f64>,
    created_at: String,
    completed_at: Option<String>,
    error: Option<String>,
}

impl JobRow {
    fn as_params(&self) -> [&dyn ToSql; 15] {
        [
            &self.id,
            &self.filename,
            &self.file_path,
            &self.status,
            &self.current_stage,
            &self.progress,
            &self.transcript,
            &self.summary,
            &self.action_items,
            &self.decisions,
            &self.participants,
            &self.duration,
            &self.created_at,
            &self.completed_at,
            &self.error,
        ]
    }
}

fn store_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    parse_timestamp(idx, &value)
}

/// Decode a JSON text column; NULL reads as the empty collection.
fn json_column<T: DeserializeOwned + Default>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    match row.get::<_, Option<String>>(idx)? {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;
    use crate::job::model::{PROGRESS_ANALYZING, PROGRESS_TRANSCRIBING};
    use crate::summarization::MeetingMinutes;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn completed_job(id: &str) -> Job {
        let mut job = Job::new(id, "standup.wav", format!("/tmp/{}.wav", id));
        job.advance(JobStatus::Transcribing, PROGRESS_TRANSCRIBING).unwrap();
        job.record_transcript("[00:00] Alice: hi".to_string(), Some(61.0)).unwrap();
        job.advance(JobStatus::Analyzing, PROGRESS_ANALYZING).unwrap();
        job.complete(MeetingMinutes {
            summary: "Short sync.".to_string(),
            action_items: vec!["Bob will file the ticket".to_string()],
            decisions: vec!["agreed to postpone".to_string()],
            participants: ["Bob", "Alice"].iter().map(|s| s.to_string()).collect(),
        })
        .unwrap();
        job
    }

    #[test]
    fn test_insert_and_get() {
        let conn = setup_db();
        let job = Job::new("job-1", "standup.mp3", "/tmp/job-1.mp3");

        assert!(JobRepository::insert(&conn, &job).unwrap());

        let stored = JobRepository::get(&conn, "job-1").unwrap().unwrap();
        assert_eq!(stored, job);
    }

    #[test]
    fn test_insert_duplicate_id_is_rejected() {
        let conn = setup_db();
        let job = Job::new("job-1", "standup.mp3", "/tmp/job-1.mp3");
        assert!(JobRepository::insert(&conn, &job).unwrap());

        let other = Job::new("job-1", "other.mp3", "/tmp/other.mp3");
        assert!(!JobRepository::insert(&conn, &other).unwrap());

        let stored = JobRepository::get(&conn, "job-1").unwrap().unwrap();
        assert_eq!(stored.filename, "standup.mp3");
    }

    #[test]
    fn test_get_nonexistent_job() {
        let conn = setup_db();
        assert!(JobRepository::get(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_save_round_trips_completed_job() {
        let conn = setup_db();
        let job = completed_job("job-2");

        assert!(JobRepository::save(&conn, &job).unwrap());

        let stored = JobRepository::get(&conn, "job-2").unwrap().unwrap();
        assert_eq!(stored, job);
        assert_eq!(
            stored.participants.iter().cloned().collect::<Vec<_>>(),
            vec!["Alice".to_string(), "Bob".to_string()]
        );
    }

    #[test]
    fn test_save_updates_open_job() {
        let conn = setup_db();
        let mut job = Job::new("job-3", "standup.mp3", "/tmp/job-3.mp3");
        JobRepository::insert(&conn, &job).unwrap();

        job.advance(JobStatus::Transcribing, PROGRESS_TRANSCRIBING).unwrap();
        assert!(JobRepository::save(&conn, &job).unwrap());

        let stored = JobRepository::get(&conn, "job-3").unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Transcribing);
        assert_eq!(stored.progress, 25);
        assert_eq!(stored.current_stage, "Transcribing");
    }

    #[test]
    fn test_save_refuses_to_touch_terminal_row() {
        let conn = setup_db();
        let job = completed_job("job-4");
        JobRepository::save(&conn, &job).unwrap();

        let mut stale = Job::new("job-4", "standup.wav", "/tmp/job-4.wav");
        stale.fail("late failure").unwrap();
        assert!(!JobRepository::save(&conn, &stale).unwrap());

        let stored = JobRepository::get(&conn, "job-4").unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert!(stored.error.is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let conn = setup_db();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            let mut job = Job::new(*id, format!("{}.mp3", id), format!("/tmp/{}.mp3", id));
            job.created_at = job.created_at + chrono::Duration::seconds(i as i64);
            JobRepository::insert(&conn, &job).unwrap();
        }

        let jobs = JobRepository::list(&conn, 2).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "c");
        assert_eq!(jobs[1].id, "b");
    }

    #[test]
    fn test_fail_interrupted_only_touches_open_jobs() {
        let conn = setup_db();
        JobRepository::insert(&conn, &Job::new("open", "a.mp3", "/tmp/a.mp3")).unwrap();
        JobRepository::save(&conn, &completed_job("done")).unwrap();

        let updated = JobRepository::fail_interrupted(&conn, "interrupted").unwrap();
        assert_eq!(updated, 1);

        let open = JobRepository::get(&conn, "open").unwrap().unwrap();
        assert_eq!(open.status, JobStatus::Failed);
        assert_eq!(open.error.as_deref(), Some("interrupted"));

        let done = JobRepository::get(&conn, "done").unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
    }

    #[test]
    fn test_null_list_columns_read_as_empty() {
        let conn = setup_db();
        conn.execute(
            "INSERT INTO jobs (id, filename, file_path, status, created_at) \
             VALUES ('legacy', 'x.mp3', '/tmp/x.mp3', 'uploaded', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let job = JobRepository::get(&conn, "legacy").unwrap().unwrap();
        assert!(job.action_items.is_empty());
        assert!(job.participants.is_empty());
        assert_eq!(job.current_stage, "");
    }
}
