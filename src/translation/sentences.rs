/*!
 * Sentence snapshot of a layout document.
 *
 * The snapshot is what a job keeps between submission and retrieval: the
 * character length of every original line and the sentences of every region,
 * each with its optional full match. Sentence order in the document is the
 * concatenation of every region's sentences in region order; the flat list
 * sent to the MT backend and the list received back both follow it.
 */

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::layout::LayoutSource;

use super::segmenter::{Sentence, SentenceSegmenter};

/// Line lengths and sentences per region
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentenceSnapshot {
    /// Character length of every line, grouped per region
    pub region_line_lengths: Vec<Vec<usize>>,

    /// Sentences grouped per region
    pub region_sentences: Vec<Vec<Sentence>>,
}

impl SentenceSnapshot {
    /// Segment every region of a document
    pub fn from_source<S: LayoutSource + ?Sized>(source: &S, segmenter: &SentenceSegmenter) -> Self {
        let regions_lines = source.regions_lines_text();

        let region_line_lengths = regions_lines
            .iter()
            .map(|lines| lines.iter().map(|l| l.chars().count()).collect())
            .collect();

        let region_sentences = regions_lines
            .iter()
            .map(|lines| segmenter.segment(&lines.join(" ")).collect())
            .collect();

        let snapshot = Self {
            region_line_lengths,
            region_sentences,
        };

        for region_index in snapshot.char_accounting_mismatches() {
            warn!("Region {}: sentence and line lengths do not add up", region_index);
        }

        snapshot
    }

    /// Number of regions
    pub fn region_count(&self) -> usize {
        self.region_line_lengths.len()
    }

    /// Number of sentences over all regions
    pub fn sentence_count(&self) -> usize {
        self.region_sentences.iter().map(Vec::len).sum()
    }

    /// Sentences grouped per region
    pub fn region_sentences(&self) -> &[Vec<Sentence>] {
        &self.region_sentences
    }

    /// All sentences in document order
    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.region_sentences.iter().flatten()
    }

    /// Split a document-ordered list back into per-region lists.
    ///
    /// Inverse of flattening: region `i` receives as many items as it has
    /// sentences in the snapshot.
    pub fn group_sentences_per_region<T: Clone>(&self, flat: &[T]) -> Result<Vec<Vec<T>>, PipelineError> {
        let expected = self.sentence_count();
        if flat.len() != expected {
            return Err(PipelineError::ReconstructionMismatch {
                expected,
                actual: flat.len(),
            });
        }

        let mut cursor = 0;
        let grouped = self
            .region_sentences
            .iter()
            .map(|region| {
                let group = flat[cursor..cursor + region.len()].to_vec();
                cursor += region.len();
                group
            })
            .collect();

        Ok(grouped)
    }

    /// Store resolved full matches on the sentences, in document order
    pub fn apply_full_matches(&mut self, full_matches: Vec<Option<String>>) -> Result<(), PipelineError> {
        let expected = self.sentence_count();
        if full_matches.len() != expected {
            return Err(PipelineError::ReconstructionMismatch {
                expected,
                actual: full_matches.len(),
            });
        }

        for (sentence, full_match) in self.region_sentences.iter_mut().flatten().zip(full_matches) {
            sentence.full_match = full_match;
        }

        Ok(())
    }

    /// Number of sentences covered by a full match
    pub fn full_match_count(&self) -> usize {
        self.sentences().filter(|s| s.has_full_match()).count()
    }

    /// Regions whose sentence spans and lines cover a different number of characters.
    ///
    /// Regions without any text are not checked.
    pub fn char_accounting_mismatches(&self) -> Vec<usize> {
        self.region_line_lengths
            .iter()
            .zip(&self.region_sentences)
            .enumerate()
            .filter(|(_, (lines, sentences))| {
                if sentences.is_empty() {
                    return false;
                }
                let line_total = lines.iter().sum::<usize>() + lines.len().saturating_sub(1);
                let sentence_total = sentences.iter().map(|s| s.char_len).sum::<usize>()
                    + sentences.len().saturating_sub(1);
                line_total != sentence_total
            })
            .map(|(i, _)| i)
            .collect()
    }
}
