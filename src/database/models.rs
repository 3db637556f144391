/*!
 * Database entity models.
 *
 * These structures map to the `jobs`, `job_lines` and `job_sentences`
 * tables and are shared by every `JobStore` implementation.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::translation::SentenceSnapshot;

/// Job status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Submitted, translation not collected yet
    Pending,
    /// Translation was collected at least once
    Done,
    /// The MT backend refused the job
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Current UTC time as RFC 3339 with a fixed fraction width, so stored
/// timestamps sort correctly as text
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// SHA-256 of a document snapshot, hex encoded
pub fn hash_document(document_json: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_json.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Everything needed to finish a job after submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// MT backend job id, or `failed-<uuid>` for refused submissions
    pub job_id: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Whether translation-memory lookups were requested
    pub use_tm: bool,
    /// SHA-256 of `document_json`
    pub document_hash: String,
    /// Layout document as it was submitted
    pub document_json: String,
    /// Line lengths and sentences (with full matches) at submit time
    pub snapshot: SentenceSnapshot,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Set when the status leaves `Pending`
    pub finished_at: Option<String>,
    /// Current status
    pub status: JobStatus,
}

impl JobRecord {
    /// Create a pending job record
    pub fn new(
        job_id: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        use_tm: bool,
        document_json: String,
        snapshot: SentenceSnapshot,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            use_tm,
            document_hash: hash_document(&document_json),
            document_json,
            snapshot,
            created_at: timestamp_now(),
            finished_at: None,
            status: JobStatus::Pending,
        }
    }

    /// Turn this record into a finished FAILED record
    pub fn into_failed(mut self) -> Self {
        self.status = JobStatus::Failed;
        self.finished_at = Some(timestamp_now());
        self
    }

    /// Whether the status has left `Pending`
    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Pending
    }
}

/// Listing entry for a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub source_language: String,
    pub target_language: String,
    pub status: JobStatus,
    pub created_at: String,
    pub finished_at: Option<String>,
    /// Number of original lines over all regions
    pub line_count: usize,
    /// Number of sentences submitted
    pub sentence_count: usize,
}

impl From<&JobRecord> for JobSummary {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.job_id.clone(),
            source_language: record.source_language.clone(),
            target_language: record.target_language.clone(),
            status: record.status,
            created_at: record.created_at.clone(),
            finished_at: record.finished_at.clone(),
            line_count: record.snapshot.region_line_lengths.iter().map(Vec::len).sum(),
            sentence_count: record.snapshot.sentence_count(),
        }
    }
}

impl fmt::Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}-{}  {}  {} lines / {} sentences  created {}",
            self.job_id,
            self.source_language,
            self.target_language,
            self.status,
            self.line_count,
            self.sentence_count,
            self.created_at
        )
    }
}
