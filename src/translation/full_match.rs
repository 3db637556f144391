/*!
 * Full-match lookups against the translation memory.
 *
 * A sentence has a full match when the memory holds a stored translation
 * with a score of at least 1.0. Such sentences are not machine translated;
 * the stored text is used verbatim. The memory is an optimisation, so a
 * failed lookup only costs the match and never the job.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::Arc;

use crate::language_utils::langpair;
use crate::providers::TranslationMemory;

use super::segmenter::Sentence;

/// Resolves exact translation-memory matches for sentences
#[derive(Debug, Clone)]
pub struct FullMatchResolver {
    memory: Arc<dyn TranslationMemory>,

    /// Memory key; empty for the public memory
    key: String,

    /// Maximum number of lookups in flight
    concurrency_limit: usize,
}

impl FullMatchResolver {
    /// Create a resolver. A `concurrency_limit` of 0 is treated as 1.
    pub fn new(memory: Arc<dyn TranslationMemory>, key: impl Into<String>, concurrency_limit: usize) -> Self {
        Self {
            memory,
            key: key.into(),
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Stored translation of `text`, if the memory has an exact match
    pub async fn resolve(&self, text: &str, source: &str, target: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        let pair = langpair(source, target);
        match self.memory.lookup(&self.key, &pair, text).await {
            Ok(matches) => {
                let full = matches.into_iter().find(|m| m.is_full_match()).map(|m| m.translation);
                if full.is_some() {
                    debug!("Full match for {:?} ({})", text, pair);
                }
                full
            }
            Err(e) => {
                warn!("Translation memory lookup failed, translating {:?} by machine: {}", text, e);
                None
            }
        }
    }

    /// Resolve every sentence, keeping the input order
    pub async fn resolve_all(&self, sentences: &[Sentence], source: &str, target: &str) -> Vec<Option<String>> {
        stream::iter(sentences.iter())
            .map(|sentence| self.resolve(&sentence.text, source, target))
            .buffered(self.concurrency_limit)
            .collect()
            .await
    }
}
