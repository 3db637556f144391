/*!
 * In-memory job store.
 */

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::StoreError;

use super::JobStore;
use super::models::{JobRecord, JobStatus, JobSummary, timestamp_now};

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<String, JobRecord>,
    /// Insertion order, oldest first
    order: Vec<String>,
}

/// Job store kept in process memory; clones share the same jobs
#[derive(Debug, Clone, Default)]
pub struct MemoryJobStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs
    pub fn len(&self) -> usize {
        self.inner.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: &JobRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.jobs.contains_key(&job.job_id) {
            return Err(StoreError::Duplicate(job.job_id.clone()));
        }

        inner.order.push(job.job_id.clone());
        inner.jobs.insert(job.job_id.clone(), job.clone());
        Ok(())
    }

    async fn get_by_job_id(&self, job_id: &str) -> Result<JobRecord, StoreError> {
        self.inner
            .read()
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))
    }

    async fn mark_finished(&self, job_id: &str, status: JobStatus) -> Result<bool, StoreError> {
        if status == JobStatus::Pending {
            return Err(StoreError::Backend("A job cannot be finished as pending".to_string()));
        }

        let mut inner = self.inner.write();
        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;

        if job.is_finished() {
            return Ok(false);
        }

        job.status = status;
        job.finished_at = Some(timestamp_now());
        Ok(true)
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<JobSummary>, StoreError> {
        let inner = self.inner.read();

        Ok(inner
            .order
            .iter()
            .rev()
            .skip(skip)
            .take(limit)
            .filter_map(|id| inner.jobs.get(id))
            .map(JobSummary::from)
            .collect())
    }
}
