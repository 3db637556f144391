/*!
 * Two-phase translation job orchestration.
 *
 * Submitting segments the document, resolves full matches, sends one batch
 * to the MT backend and stores everything needed to finish the job later.
 * Retrieving polls the backend; once the translation is there it is merged
 * with the full matches and put back onto the original lines.
 *
 * Job states: `PENDING -> DONE` or `PENDING -> FAILED` (submission only).
 * A backend that never finishes keeps the job pending; giving up is the
 * caller's decision.
 */

use bytes::Bytes;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::database::{JobRecord, JobStatus, JobStore, JobSummary};
use crate::errors::PipelineError;
use crate::language_utils::{language_codes_match, normalize_to_part1};
use crate::layout::{LayoutDocument, LayoutSink};
use crate::providers::{MachineTranslator, PollResult};

use super::batch::{parse_translated_lines, submit_batch};
use super::full_match::FullMatchResolver;
use super::reconstruct::{OverflowPolicy, merge_full_matches, reconstruct_lines};
use super::segmenter::SentenceSegmenter;
use super::sentences::SentenceSnapshot;

/// A document to translate
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub document: LayoutDocument,
    pub source_language: String,
    pub target_language: String,
    /// Look up full matches in the translation memory before submitting
    pub use_tm: bool,
}

/// Translation of a finished job
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedDocument {
    pub job_id: String,
    pub target_language: String,
    /// Reconstructed text per region, one entry per original line
    pub region_lines: Vec<Vec<String>>,
    /// Submitted document with every line's translation filled in
    pub document: LayoutDocument,
}

/// Result of a retrieve call
#[derive(Debug, Clone, PartialEq)]
pub enum RetrieveOutcome {
    /// The MT backend has not finished the job yet
    NotReady,
    /// The job is finished
    Ready(TranslatedDocument),
}

/// Drives submission and retrieval of translation jobs
pub struct TranslationOrchestrator {
    mt: Arc<dyn MachineTranslator>,
    resolver: FullMatchResolver,
    store: Arc<dyn JobStore>,
    overflow: OverflowPolicy,
}

impl TranslationOrchestrator {
    /// Create an orchestrator over long-lived backend and store handles
    pub fn new(mt: Arc<dyn MachineTranslator>, resolver: FullMatchResolver, store: Arc<dyn JobStore>) -> Self {
        Self {
            mt,
            resolver,
            store,
            overflow: OverflowPolicy::default(),
        }
    }

    /// Choose how sentences running over several lines are put back
    pub fn with_overflow_policy(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Submit a document and return the job id without waiting for the translation
    pub async fn submit(&self, request: SubmitRequest) -> Result<String, PipelineError> {
        let source = normalize_to_part1(&request.source_language)
            .map_err(|_| PipelineError::InvalidLanguage(request.source_language.clone()))?;
        let target = normalize_to_part1(&request.target_language)
            .map_err(|_| PipelineError::InvalidLanguage(request.target_language.clone()))?;
        if language_codes_match(&source, &target) {
            warn!("Source and target language are both {}", source);
        }

        let mut document = request.document;
        document.source_language = Some(source.clone());
        let document_json = document
            .to_json()
            .map_err(|e| PipelineError::Layout(format!("{:#}", e)))?;

        let segmenter = SentenceSegmenter::new(&source);
        let mut snapshot = SentenceSnapshot::from_source(&document, &segmenter);
        debug!(
            "Segmented {} regions into {} sentences",
            snapshot.region_count(),
            snapshot.sentence_count()
        );

        if request.use_tm {
            let sentences: Vec<_> = snapshot.sentences().cloned().collect();
            let full_matches = self.resolver.resolve_all(&sentences, &source, &target).await;
            snapshot.apply_full_matches(full_matches)?;
            info!(
                "{} of {} sentences have a full match",
                snapshot.full_match_count(),
                snapshot.sentence_count()
            );
        }

        let sentences: Vec<_> = snapshot.sentences().cloned().collect();
        match submit_batch(self.mt.as_ref(), &sentences, &source, &target).await {
            Ok(job_id) => {
                let job = JobRecord::new(&job_id, source, target, request.use_tm, document_json, snapshot);
                if let Err(store_error) = self.store.create(&job).await {
                    error!("MT job {} was accepted but not stored: {}", job_id, store_error);
                    return Err(PipelineError::Unrecorded {
                        job_id,
                        source: store_error,
                    });
                }
                Ok(job_id)
            }
            Err(e) => {
                let audit_id = format!("failed-{}", Uuid::new_v4());
                warn!("Submission failed, recording job {}: {}", audit_id, e);

                let job = JobRecord::new(&audit_id, source, target, request.use_tm, document_json, snapshot)
                    .into_failed();
                if let Err(store_error) = self.store.create(&job).await {
                    warn!("Could not record failed job {}: {}", audit_id, store_error);
                }

                Err(e.into())
            }
        }
    }

    /// Poll the MT backend once and, if the job is finished, rebuild the lines
    pub async fn retrieve(&self, job_id: &str) -> Result<RetrieveOutcome, PipelineError> {
        let job = self.store.get_by_job_id(job_id).await?;
        if job.status == JobStatus::Failed {
            return Err(PipelineError::JobFailed(job_id.to_string()));
        }

        let content = match self.mt.poll(job_id).await {
            Ok(PollResult::Ready(content)) => content,
            Ok(PollResult::Pending) => {
                debug!("Job {} not ready", job_id);
                return Ok(RetrieveOutcome::NotReady);
            }
            Err(e) => {
                warn!("Polling job {} failed, treating it as not ready: {}", job_id, e);
                return Ok(RetrieveOutcome::NotReady);
            }
        };

        let translated = self.finish(&job, &content)?;

        match self.store.mark_finished(job_id, JobStatus::Done).await {
            Ok(true) => info!("Job {} done", job_id),
            Ok(false) => {}
            Err(e) => warn!("Job {} is translated but its status was not updated: {}", job_id, e),
        }

        Ok(RetrieveOutcome::Ready(translated))
    }

    /// Retrieve, sleeping `poll_interval` between attempts until the job is finished.
    ///
    /// Never gives up on its own; bound it with `tokio::time::timeout`.
    pub async fn retrieve_blocking(
        &self,
        job_id: &str,
        poll_interval: Duration,
    ) -> Result<TranslatedDocument, PipelineError> {
        loop {
            match self.retrieve(job_id).await? {
                RetrieveOutcome::Ready(translated) => return Ok(translated),
                RetrieveOutcome::NotReady => tokio::time::sleep(poll_interval).await,
            }
        }
    }

    /// Submit a document and wait for its translation
    pub async fn translate_blocking(
        &self,
        request: SubmitRequest,
        poll_interval: Duration,
    ) -> Result<TranslatedDocument, PipelineError> {
        let job_id = self.submit(request).await?;
        self.retrieve_blocking(&job_id, poll_interval).await
    }

    /// Stored jobs, newest first
    pub async fn list_jobs(&self, skip: usize, limit: usize) -> Result<Vec<JobSummary>, PipelineError> {
        Ok(self.store.list(skip, limit).await?)
    }

    fn finish(&self, job: &JobRecord, content: &Bytes) -> Result<TranslatedDocument, PipelineError> {
        let sentences: Vec<_> = job.snapshot.sentences().cloned().collect();
        let machine_translated = parse_translated_lines(content, &sentences)?;
        let texts = merge_full_matches(&job.snapshot, machine_translated)?;
        let region_lines = reconstruct_lines(&job.snapshot, &texts, self.overflow)?;

        let mut document =
            LayoutDocument::from_json(&job.document_json).map_err(|e| PipelineError::Layout(format!("{:#}", e)))?;
        for (region_index, lines) in region_lines.iter().enumerate() {
            document
                .write_region(region_index, lines)
                .map_err(|e| PipelineError::Layout(format!("{:#}", e)))?;
        }
        document.target_language = Some(job.target_language.clone());

        Ok(TranslatedDocument {
            job_id: job.job_id.clone(),
            target_language: job.target_language.clone(),
            region_lines,
            document,
        })
    }
}
