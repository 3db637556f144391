/*!
 * Job persistence.
 *
 * Everything the retrieve path needs is captured at submission time and
 * kept in a `JobStore`:
 * - `Repository`: SQLite storage (connection, schema, models, repository)
 * - `MemoryJobStore`: in-process storage for tests and one-shot runs
 */

use async_trait::async_trait;

use crate::errors::StoreError;

pub mod connection;
pub mod memory;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::{DatabaseConnection, DatabaseStats};
pub use memory::MemoryJobStore;
pub use models::{JobRecord, JobStatus, JobSummary};
pub use repository::Repository;

/// Storage of translation jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job; fails with `StoreError::Duplicate` if the id is taken
    async fn create(&self, job: &JobRecord) -> Result<(), StoreError>;

    /// Load a job; fails with `StoreError::NotFound` for unknown ids
    async fn get_by_job_id(&self, job_id: &str) -> Result<JobRecord, StoreError>;

    /// Move a pending job to `status` and stamp its finish time.
    ///
    /// Finished jobs are left untouched; the return value tells whether
    /// anything changed.
    async fn mark_finished(&self, job_id: &str, status: JobStatus) -> Result<bool, StoreError>;

    /// Jobs ordered newest first
    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<JobSummary>, StoreError>;
}
