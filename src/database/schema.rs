/*!
 * Job tables.
 *
 * One `jobs` row per submitted document, one `job_lines` row per original
 * line and one `job_sentences` row per sentence. Line and sentence rows go
 * away with their job.
 */

use anyhow::{Context, Result};
use rusqlite::Connection;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    job_id TEXT PRIMARY KEY,
    source_language TEXT NOT NULL,
    target_language TEXT NOT NULL,
    use_tm INTEGER NOT NULL,
    document_hash TEXT NOT NULL,
    document_json TEXT NOT NULL,
    -- keeps regions without lines
    region_count INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    finished_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_jobs_created ON jobs(created_at);

CREATE TABLE IF NOT EXISTS job_lines (
    job_id TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
    region_index INTEGER NOT NULL,
    line_index INTEGER NOT NULL,
    char_len INTEGER NOT NULL,
    PRIMARY KEY (job_id, region_index, line_index)
);

CREATE TABLE IF NOT EXISTS job_sentences (
    job_id TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
    region_index INTEGER NOT NULL,
    sentence_index INTEGER NOT NULL,
    text TEXT NOT NULL,
    start_offset INTEGER NOT NULL,
    char_len INTEGER NOT NULL,
    leading INTEGER NOT NULL DEFAULT 0,
    full_match TEXT,
    PRIMARY KEY (job_id, region_index, sentence_index)
);
"#;

/// Create the job tables if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES)
        .context("Failed to create job tables")
}
