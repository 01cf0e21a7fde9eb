//! Async job store over the SQLite repository.
//!
//! rusqlite is blocking, so every call runs on the blocking pool behind a
//! single shared connection.

use anyhow::{anyhow, Context};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::db::{self, JobRepository};

use super::error::JobError;
use super::model::Job;

#[derive(Clone)]
pub struct JobStore {
    conn: Arc<Mutex<Connection>>,
}

impl JobStore {
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        let conn = db::open(db_path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        db::migrate(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| anyhow!("Job database lock poisoned"))?;
            f(&conn)
        })
        .await
        .context("Job database task failed")?
    }

    /// Persist a new job. Fails if the id already exists.
    pub async fn create(&self, job: &Job) -> Result<(), JobError> {
        let record = job.clone();
        let inserted = self
            .with_conn(move |conn| JobRepository::insert(conn, &record))
            .await?;

        if !inserted {
            return Err(JobError::AlreadyExists(job.id.clone()));
        }
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Job>, JobError> {
        let id = id.to_string();
        Ok(self
            .with_conn(move |conn| JobRepository::get(conn, &id))
            .await?)
    }

    /// Like [`JobStore::get`], but a missing job is an error.
    pub async fn require(&self, id: &str) -> Result<Job, JobError> {
        self.get(id)
            .await?
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    /// Write every field of the job. A stored terminal record is never overwritten.
    pub async fn save(&self, job: &Job) -> Result<(), JobError> {
        let record = job.clone();
        let written = self
            .with_conn(move |conn| JobRepository::save(conn, &record))
            .await?;

        if !written {
            let stored = self.require(&job.id).await?;
            return Err(JobError::TerminalState {
                id: job.id.clone(),
                status: stored.status,
            });
        }
        Ok(())
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<Job>, JobError> {
        Ok(self
            .with_conn(move |conn| JobRepository::list(conn, limit))
            .await?)
    }

    /// Fail every job a previous process left unfinished.
    pub async fn fail_interrupted(&self, error: &str) -> Result<usize, JobError> {
        let error = error.to_string();
        Ok(self
            .with_conn(move |conn| JobRepository::fail_interrupted(conn, &error))
            .await?)
    }

    #[cfg(test)]
    pub(crate) async fn execute_batch(&self, sql: &str) -> anyhow::Result<()> {
        let sql = sql.to_string();
        self.with_conn(move |conn| Ok(conn.execute_batch(&sql)?)).await
    }
}
