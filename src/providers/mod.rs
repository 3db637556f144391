/*!
 * Collaborator interfaces for the translation backends.
 *
 * Two backends take part in a translation job:
 * - a document-level machine translation service that accepts a text file
 *   with one sentence per line and hands back a translated file later
 *   (`MachineTranslator`, implemented over HTTP by `etranslation`)
 * - a translation memory that is asked for stored translations of single
 *   sentences and can be maintained (units added, deleted or imported from
 *   TMX) (`TranslationMemory`, implemented over HTTP by `mouse_tm`)
 *
 * `mock` holds in-process doubles of both for tests.
 */

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::{ProviderError, SubmissionError};

/// State of an MT job as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// The backend has not finished translating yet
    Pending,

    /// Raw bytes of the translated file
    Ready(Bytes),
}

/// Asynchronous document machine translation
#[async_trait]
pub trait MachineTranslator: Send + Sync + Debug {
    /// Submit a newline-terminated plain-text payload.
    ///
    /// Returns the backend's job identifier.
    async fn submit(&self, source: &str, target: &str, payload: Bytes) -> Result<String, SubmissionError>;

    /// Ask the backend whether the job is done, fetching the content if it is
    async fn poll(&self, job_id: &str) -> Result<PollResult, ProviderError>;
}

/// One translation-memory hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmMatch {
    /// Match score, 1.0 (or above) meaning an exact match
    #[serde(rename = "match")]
    pub confidence: f64,

    /// Stored translation of the segment
    pub translation: String,
}

impl TmMatch {
    /// Whether this hit is an exact match of the query
    pub fn is_full_match(&self) -> bool {
        self.confidence >= 1.0
    }
}

/// Translation-memory lookups and maintenance.
///
/// `key` selects a private memory (empty for the public one) and `langpair`
/// has the form `"{source}-{target}"`, e.g. `"en-nl"`.
#[async_trait]
pub trait TranslationMemory: Send + Sync + Debug {
    /// Look up stored translations of `query`
    async fn lookup(&self, key: &str, langpair: &str, query: &str) -> Result<Vec<TmMatch>, ProviderError>;

    /// Check that the memory is up
    async fn health(&self) -> Result<(), ProviderError>;

    /// Store `translation` as a translation unit for `segment`
    async fn add_unit(&self, key: &str, langpair: &str, segment: &str, translation: &str) -> Result<(), ProviderError>;

    /// Remove a stored translation unit
    async fn delete_unit(&self, key: &str, langpair: &str, segment: &str, translation: &str)
        -> Result<(), ProviderError>;

    /// Upload the units of a TMX file; `name` labels the import
    async fn import_tmx(&self, key: &str, name: &str, tmx: Bytes) -> Result<(), ProviderError>;

    /// Number of stored translation units for the language pair
    async fn unit_count(&self, key: &str, langpair: &str) -> Result<u64, ProviderError>;

    /// Language pairs the memory holds units for
    async fn language_pairs(&self, key: &str) -> Result<Vec<String>, ProviderError>;
}

pub mod etranslation;
pub mod mock;
pub mod mouse_tm;
