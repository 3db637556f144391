/*!
 * SQLite job store.
 *
 * A job is spread over three tables: the `jobs` row itself, one `job_lines`
 * row per original line and one `job_sentences` row per sentence. Rows are
 * written in one transaction and read back into a `JobRecord`.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::StoreError;
use crate::translation::{Sentence, SentenceSnapshot};

use super::JobStore;
use super::connection::DatabaseConnection;
use super::models::{JobRecord, JobStatus, JobSummary, timestamp_now};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn insert_job_sync(tx: &rusqlite::Transaction, job: &JobRecord) -> Result<()> {
        tx.execute(
            r#"
            INSERT INTO jobs (
                job_id, source_language, target_language, use_tm, document_hash,
                document_json, region_count, status, created_at, finished_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                job.job_id,
                job.source_language,
                job.target_language,
                job.use_tm,
                job.document_hash,
                job.document_json,
                job.snapshot.region_count() as i64,
                job.status.to_string(),
                job.created_at,
                job.finished_at,
            ],
        )?;

        let mut insert_line = tx.prepare(
            "INSERT INTO job_lines (job_id, region_index, line_index, char_len) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (region_index, lengths) in job.snapshot.region_line_lengths.iter().enumerate() {
            for (line_index, char_len) in lengths.iter().enumerate() {
                insert_line.execute(params![
                    job.job_id,
                    region_index as i64,
                    line_index as i64,
                    *char_len as i64
                ])?;
            }
        }

        let mut insert_sentence = tx.prepare(
            r#"
            INSERT INTO job_sentences (
                job_id, region_index, sentence_index, text, start_offset, char_len, leading, full_match
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;
        for (region_index, sentences) in job.snapshot.region_sentences.iter().enumerate() {
            for (sentence_index, sentence) in sentences.iter().enumerate() {
                insert_sentence.execute(params![
                    job.job_id,
                    region_index as i64,
                    sentence_index as i64,
                    sentence.text,
                    sentence.start as i64,
                    sentence.char_len as i64,
                    sentence.leading as i64,
                    sentence.full_match,
                ])?;
            }
        }

        Ok(())
    }

    /// Load a job with its lines and sentences (synchronous, for use inside closures)
    fn get_job_sync(conn: &Connection, job_id: &str) -> Result<Option<JobRecord>> {
        let row = conn
            .query_row(
                r#"
                SELECT job_id, source_language, target_language, use_tm, document_hash,
                       document_json, region_count, status, created_at, finished_at
                FROM jobs WHERE job_id = ?1
                "#,
                [job_id],
                |row| {
                    Ok((
                        JobRecord {
                            job_id: row.get(0)?,
                            source_language: row.get(1)?,
                            target_language: row.get(2)?,
                            use_tm: row.get(3)?,
                            document_hash: row.get(4)?,
                            document_json: row.get(5)?,
                            snapshot: SentenceSnapshot::default(),
                            status: status_column(row, 7)?,
                            created_at: row.get(8)?,
                            finished_at: row.get(9)?,
                        },
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((mut job, region_count)) = row else {
            return Ok(None);
        };

        let region_count = region_count.max(0) as usize;
        let mut region_line_lengths: Vec<Vec<usize>> = vec![Vec::new(); region_count];
        let mut region_sentences: Vec<Vec<Sentence>> = vec![Vec::new(); region_count];

        let mut lines_stmt = conn.prepare(
            "SELECT region_index, char_len FROM job_lines WHERE job_id = ?1 ORDER BY region_index, line_index",
        )?;
        let lines = lines_stmt.query_map([job_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for line in lines {
            let (region_index, char_len) = line?;
            if let Some(region) = region_line_lengths.get_mut(region_index as usize) {
                region.push(char_len as usize);
            }
        }

        let mut sentences_stmt = conn.prepare(
            r#"
            SELECT region_index, text, start_offset, char_len, leading, full_match
            FROM job_sentences WHERE job_id = ?1
            ORDER BY region_index, sentence_index
            "#,
        )?;
        let sentences = sentences_stmt.query_map([job_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Sentence {
                    text: row.get(1)?,
                    start: row.get::<_, i64>(2)? as usize,
                    char_len: row.get::<_, i64>(3)? as usize,
                    leading: row.get::<_, i64>(4)? as usize,
                    full_match: row.get(5)?,
                },
            ))
        })?;
        for sentence in sentences {
            let (region_index, sentence) = sentence?;
            if let Some(region) = region_sentences.get_mut(region_index as usize) {
                region.push(sentence);
            }
        }

        job.snapshot = SentenceSnapshot {
            region_line_lengths,
            region_sentences,
        };

        Ok(Some(job))
    }
}

/// Read a status column; an unknown value fails the row
fn status_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<JobStatus> {
    let value: String = row.get(index)?;
    value
        .parse()
        .map_err(|e: anyhow::Error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, e.into()))
}

#[async_trait]
impl JobStore for Repository {
    async fn create(&self, job: &JobRecord) -> Result<(), StoreError> {
        let job = job.clone();
        let job_id = job.job_id.clone();

        let inserted = self
            .db
            .transaction_async(move |tx| {
                let exists: bool = tx.query_row(
                    "SELECT COUNT(*) > 0 FROM jobs WHERE job_id = ?1",
                    [&job.job_id],
                    |row| row.get(0),
                )?;
                if exists {
                    return Ok(false);
                }

                Self::insert_job_sync(tx, &job)?;
                Ok(true)
            })
            .await?;

        if !inserted {
            return Err(StoreError::Duplicate(job_id));
        }

        debug!("Stored job {}", job_id);
        Ok(())
    }

    async fn get_by_job_id(&self, job_id: &str) -> Result<JobRecord, StoreError> {
        let id = job_id.to_string();

        self.db
            .execute_async(move |conn| Self::get_job_sync(conn, &id))
            .await?
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))
    }

    async fn mark_finished(&self, job_id: &str, status: JobStatus) -> Result<bool, StoreError> {
        if status == JobStatus::Pending {
            return Err(StoreError::Backend("A job cannot be finished as pending".to_string()));
        }

        let id = job_id.to_string();
        let now = timestamp_now();

        let outcome = self
            .db
            .execute_async(move |conn| {
                let changed = conn.execute(
                    "UPDATE jobs SET status = ?1, finished_at = ?2 WHERE job_id = ?3 AND status = 'pending'",
                    params![status.to_string(), now, id],
                )?;
                if changed > 0 {
                    return Ok(Some(true));
                }

                let exists: bool = conn.query_row(
                    "SELECT COUNT(*) > 0 FROM jobs WHERE job_id = ?1",
                    [&id],
                    |row| row.get(0),
                )?;
                Ok(exists.then_some(false))
            })
            .await?;

        outcome.ok_or_else(|| StoreError::NotFound(job_id.to_string()))
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<JobSummary>, StoreError> {
        let jobs = self
            .db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT j.job_id, j.source_language, j.target_language, j.status,
                           j.created_at, j.finished_at,
                           (SELECT COUNT(*) FROM job_lines l WHERE l.job_id = j.job_id),
                           (SELECT COUNT(*) FROM job_sentences s WHERE s.job_id = j.job_id)
                    FROM jobs j
                    ORDER BY j.created_at DESC, j.rowid DESC
                    LIMIT ?1 OFFSET ?2
                    "#,
                )?;

                let rows = stmt.query_map(params![limit as i64, skip as i64], |row| {
                    Ok(JobSummary {
                        job_id: row.get(0)?,
                        source_language: row.get(1)?,
                        target_language: row.get(2)?,
                        status: status_column(row, 3)?,
                        created_at: row.get(4)?,
                        finished_at: row.get(5)?,
                        line_count: row.get::<_, i64>(6)? as usize,
                        sentence_count: row.get::<_, i64>(7)? as usize,
                    })
                })?;

                let mut jobs = Vec::new();
                for row in rows {
                    jobs.push(row?);
                }
                Ok(jobs)
            })
            .await?;

        Ok(jobs)
    }
}
