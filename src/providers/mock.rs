/*!
 * Mock backend implementations for testing.
 *
 * - `MockMachineTranslator::working()` - translates every payload line
 * - `MockMachineTranslator::pending_for(n)` - reports "not ready" n times first
 * - `MockMachineTranslator::rejecting()` - refuses every job
 * - `MockMachineTranslator::failing()` - cannot be reached
 * - `MockMachineTranslator::failing_poll()` - accepts jobs, then cannot be reached
 * - `MockMachineTranslator::truncated()` - drops the last translated line
 * - `MockTranslationMemory` - answers from a table that its maintenance
 *   calls edit, or always fails
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{ProviderError, SubmissionError};
use crate::providers::{MachineTranslator, PollResult, TmMatch, TranslationMemory};

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Accepts jobs and has them ready at the first poll
    Working,
    /// Accepts jobs but reports them pending for this many polls
    PendingFor { polls: usize },
    /// Refuses every submission
    Rejecting,
    /// Every request fails with a connection error
    Failing,
    /// Accepts jobs, but every poll fails with a connection error
    FailingPoll,
    /// Ready content lacks the last line
    Truncated,
}

#[derive(Debug, Clone)]
struct SubmittedJob {
    target: String,
    payload: String,
    polls: usize,
}

/// Mock machine translator.
///
/// Non-empty payload lines come back as `"[{target}] {line}"`; empty lines
/// stay empty.
#[derive(Debug, Clone)]
pub struct MockMachineTranslator {
    behavior: MockBehavior,
    jobs: Arc<Mutex<HashMap<String, SubmittedJob>>>,
    submit_count: Arc<AtomicUsize>,
    custom_response: Option<fn(&str) -> String>,
}

impl MockMachineTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            submit_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a translator whose jobs are ready immediately
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a translator that needs `polls` extra polls per job
    pub fn pending_for(polls: usize) -> Self {
        Self::new(MockBehavior::PendingFor { polls })
    }

    /// Create a translator that refuses every job
    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    /// Create a translator that cannot be reached
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a translator that accepts jobs and then becomes unreachable
    pub fn failing_poll() -> Self {
        Self::new(MockBehavior::FailingPoll)
    }

    /// Create a translator that loses the last line of every job
    pub fn truncated() -> Self {
        Self::new(MockBehavior::Truncated)
    }

    /// Translate every non-empty line with `generator` instead of the default prefix
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of submit calls received
    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    /// Payload text of a submitted job
    pub fn payload_of(&self, job_id: &str) -> Option<String> {
        self.jobs.lock().get(job_id).map(|j| j.payload.clone())
    }

    /// Payload of the most recently submitted job
    pub fn last_payload(&self) -> Option<String> {
        let count = self.submit_count();
        if count == 0 {
            return None;
        }
        self.payload_of(&format!("mock-{}", count))
    }

    fn translate_payload(&self, target: &str, payload: &str) -> String {
        let mut lines: Vec<String> = payload
            .lines()
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else if let Some(generator) = self.custom_response {
                    generator(line)
                } else {
                    format!("[{}] {}", target, line)
                }
            })
            .collect();

        if self.behavior == MockBehavior::Truncated {
            lines.pop();
        }

        lines.iter().map(|l| format!("{}\n", l)).collect()
    }
}

#[async_trait]
impl MachineTranslator for MockMachineTranslator {
    async fn submit(&self, _source: &str, target: &str, payload: Bytes) -> Result<String, SubmissionError> {
        match self.behavior {
            MockBehavior::Rejecting => return Err(SubmissionError::Rejected("mock rejection".to_string())),
            MockBehavior::Failing => {
                return Err(ProviderError::ConnectionError("mock backend unreachable".to_string()).into());
            }
            _ => {}
        }

        let count = self.submit_count.fetch_add(1, Ordering::SeqCst) + 1;
        let job_id = format!("mock-{}", count);

        self.jobs.lock().insert(
            job_id.clone(),
            SubmittedJob {
                target: target.to_string(),
                payload: String::from_utf8_lossy(&payload).into_owned(),
                polls: 0,
            },
        );

        Ok(job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<PollResult, ProviderError> {
        if matches!(self.behavior, MockBehavior::Failing | MockBehavior::FailingPoll) {
            return Err(ProviderError::ConnectionError("mock backend unreachable".to_string()));
        }

        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(job_id).ok_or_else(|| ProviderError::ApiError {
            status_code: 404,
            message: format!("unknown job {}", job_id),
        })?;

        job.polls += 1;
        if let MockBehavior::PendingFor { polls } = self.behavior {
            if job.polls <= polls {
                return Ok(PollResult::Pending);
            }
        }

        let content = self.translate_payload(&job.target, &job.payload);
        Ok(PollResult::Ready(Bytes::from(content)))
    }
}

/// Mock translation memory backed by a table; clones share it
#[derive(Debug, Clone, Default)]
pub struct MockTranslationMemory {
    /// Matches per `(langpair, query)`
    entries: Arc<Mutex<HashMap<(String, String), Vec<TmMatch>>>>,
    /// Names of imported TMX files
    imports: Arc<Mutex<Vec<String>>>,
    failing: bool,
    lookup_count: Arc<AtomicUsize>,
}

impl MockTranslationMemory {
    /// Create an empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory whose every lookup fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Add a hit for `query` in `langpair`
    pub fn with_match(self, langpair: &str, query: &str, confidence: f64, translation: &str) -> Self {
        self.insert(langpair, query, confidence, translation);
        self
    }

    /// Number of lookups received
    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    /// Names of the TMX files imported so far
    pub fn imported(&self) -> Vec<String> {
        self.imports.lock().clone()
    }

    fn insert(&self, langpair: &str, query: &str, confidence: f64, translation: &str) {
        self.entries
            .lock()
            .entry((langpair.to_string(), query.to_string()))
            .or_default()
            .push(TmMatch {
                confidence,
                translation: translation.to_string(),
            });
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.failing {
            return Err(ProviderError::ApiError {
                status_code: 503,
                message: "mock memory unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TranslationMemory for MockTranslationMemory {
    async fn lookup(&self, _key: &str, langpair: &str, query: &str) -> Result<Vec<TmMatch>, ProviderError> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        Ok(self
            .entries
            .lock()
            .get(&(langpair.to_string(), query.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn health(&self) -> Result<(), ProviderError> {
        self.check_available()
    }

    async fn add_unit(&self, _key: &str, langpair: &str, segment: &str, translation: &str) -> Result<(), ProviderError> {
        self.check_available()?;
        self.insert(langpair, segment, 1.0, translation);
        Ok(())
    }

    async fn delete_unit(
        &self,
        _key: &str,
        langpair: &str,
        segment: &str,
        translation: &str,
    ) -> Result<(), ProviderError> {
        self.check_available()?;

        let mut entries = self.entries.lock();
        let entry_key = (langpair.to_string(), segment.to_string());
        if let Some(matches) = entries.get_mut(&entry_key) {
            matches.retain(|m| m.translation != translation);
            if matches.is_empty() {
                entries.remove(&entry_key);
            }
        }
        Ok(())
    }

    async fn import_tmx(&self, _key: &str, name: &str, _tmx: Bytes) -> Result<(), ProviderError> {
        self.check_available()?;
        self.imports.lock().push(name.to_string());
        Ok(())
    }

    async fn unit_count(&self, _key: &str, langpair: &str) -> Result<u64, ProviderError> {
        self.check_available()?;

        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|((pair, _), _)| pair == langpair)
            .map(|(_, matches)| matches.len() as u64)
            .sum())
    }

    async fn language_pairs(&self, _key: &str) -> Result<Vec<String>, ProviderError> {
        self.check_available()?;

        let mut pairs: Vec<String> = self.entries.lock().keys().map(|(pair, _)| pair.clone()).collect();
        pairs.sort();
        pairs.dedup();
        Ok(pairs)
    }
}
