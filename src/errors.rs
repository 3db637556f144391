/*!
 * Error types for the pagetrans application.
 *
 * This module contains custom error types for the different stages of a
 * translation job, using the thiserror crate for ergonomic error definitions.
 *
 * "Translation not finished yet" is not an error: the retrieve path reports
 * it as a value (`RetrieveOutcome::NotReady`).
 */

use thiserror::Error;

/// Errors that can occur when talking to the MT or TM backends
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised while submitting a batch to the MT backend.
///
/// Any of these is fatal for the document's translation attempt.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The document produced no sentences at all
    #[error("Nothing to translate: the document contains no sentences")]
    EmptyPayload,

    /// The backend accepted the request but refused the job
    #[error("MT backend rejected the job: {0}")]
    Rejected(String),

    /// The backend could not be reached or answered with an error status
    #[error("MT backend error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors from a job store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// No job is stored under the identifier
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A job with this identifier already exists
    #[error("Job already exists: {0}")]
    Duplicate(String),

    /// The storage engine failed
    #[error("Storage error: {0}")]
    Backend(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(error: anyhow::Error) -> Self {
        Self::Backend(format!("{:#}", error))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Errors from the submit/retrieve pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Submission to the MT backend failed
    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),

    /// The job store failed or the job is unknown
    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    /// The translated sentence count does not line up with the stored snapshot
    #[error("Reconstruction mismatch: expected {expected} sentences, got {actual}")]
    ReconstructionMismatch {
        /// Sentence count recorded at submit time
        expected: usize,
        /// Sentence count delivered for reconstruction
        actual: usize,
    },

    /// The job was recorded as failed at submit time
    #[error("Job {0} failed at submission and has no translation")]
    JobFailed(String),

    /// A language code could not be recognised
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),

    /// The layout document could not be read or written
    #[error("Layout error: {0}")]
    Layout(String),

    /// The MT backend accepted the job but it could not be stored
    #[error("MT job {job_id} was accepted but could not be stored: {source}")]
    Unrecorded {
        /// Identifier the MT backend gave the job
        job_id: String,
        /// Why the job store refused it
        source: StoreError,
    },
}
