/*!
 * Reassignment of translated sentences onto the original lines.
 *
 * Translated text has no line structure of its own, so lines are rebuilt
 * from the *source* geometry: the character spans of the original lines and
 * of the original sentences in the region text. A sentence belongs to the
 * line whose span contains the sentence's first non-blank character, using
 * half-open spans `[line_start, line_start + line_len + 1)` that include the
 * separating space.
 *
 * A sentence whose source span runs on into later lines is handled by the
 * `OverflowPolicy`: either kept whole on the line it starts on, or divided
 * over the lines it covers, cutting the translation at the whitespace
 * nearest to each line boundary scaled by the source/translation length
 * ratio. Full matches are always kept whole.
 */

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

use super::segmenter::Sentence;
use super::sentences::SentenceSnapshot;

/// What to do with a sentence whose source text continues on the next line(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Divide the text over the lines the source sentence covers
    #[default]
    Distribute,
    /// Keep the text whole on the line the sentence starts on
    KeepWhole,
}

/// Replace the MT output of every fully matched sentence with its cached translation.
///
/// `machine_translated` is document ordered, one entry per snapshot sentence.
pub fn merge_full_matches(
    snapshot: &SentenceSnapshot,
    machine_translated: Vec<String>,
) -> Result<Vec<String>, PipelineError> {
    let expected = snapshot.sentence_count();
    if machine_translated.len() != expected {
        return Err(PipelineError::ReconstructionMismatch {
            expected,
            actual: machine_translated.len(),
        });
    }

    Ok(snapshot
        .sentences()
        .zip(machine_translated)
        .map(|(sentence, translated)| match &sentence.full_match {
            Some(full_match) => full_match.clone(),
            None => translated,
        })
        .collect())
}

/// Rebuild the per-line text of every region.
///
/// `texts` holds the final text of every snapshot sentence in document
/// order (machine translations with full matches already merged in). The
/// result has one entry per region and, inside it, one entry per original line.
pub fn reconstruct_lines(
    snapshot: &SentenceSnapshot,
    texts: &[String],
    policy: OverflowPolicy,
) -> Result<Vec<Vec<String>>, PipelineError> {
    let grouped = snapshot.group_sentences_per_region(texts)?;

    Ok(snapshot
        .region_line_lengths
        .iter()
        .zip(&snapshot.region_sentences)
        .zip(&grouped)
        .map(|((line_lengths, sentences), texts)| reconstruct_region(line_lengths, sentences, texts, policy))
        .collect())
}

/// Distribute one region's sentences over its lines.
///
/// Sentence spans are walked from their source `char_len`s; `texts[i]` is the
/// final text of `sentences[i]`.
pub fn reconstruct_region(
    line_lengths: &[usize],
    sentences: &[Sentence],
    texts: &[String],
    policy: OverflowPolicy,
) -> Vec<String> {
    let sentence_count = sentences.len().min(texts.len());

    let mut line_starts = Vec::with_capacity(line_lengths.len());
    let mut offset = 0;
    for &line_len in line_lengths {
        line_starts.push(offset);
        offset += line_len + 1;
    }

    let mut pieces: Vec<Vec<String>> = vec![Vec::new(); line_lengths.len()];
    let mut next_sentence = 0;
    let mut sentence_start = 0;

    for (line_index, (&line_start, &line_len)) in line_starts.iter().zip(line_lengths).enumerate() {
        let line_end = line_start + line_len + 1;

        while next_sentence < sentence_count {
            let sentence = &sentences[next_sentence];
            let text_start = sentence_start + sentence.leading.min(sentence.char_len);
            if !(line_start <= text_start && text_start < line_end) {
                break;
            }

            let text = &texts[next_sentence];
            let span_end = sentence_start + sentence.char_len;

            if policy == OverflowPolicy::Distribute && !sentence.has_full_match() {
                // Separator positions of later lines that fall inside this span
                let boundaries: Vec<usize> = line_starts[line_index + 1..]
                    .iter()
                    .take_while(|&&start| start < span_end)
                    .map(|&start| start - 1 - sentence_start)
                    .collect();

                for (i, part) in split_at_boundaries(text, sentence, &boundaries)
                    .into_iter()
                    .enumerate()
                {
                    pieces[line_index + i].push(part);
                }
            } else {
                pieces[line_index].push(text.clone());
            }

            sentence_start += sentence.char_len + 1;
            next_sentence += 1;
        }
    }

    if next_sentence < sentence_count {
        warn!(
            "{} sentence(s) start beyond the last line; appending them to it",
            sentence_count - next_sentence
        );
        if let Some(last) = pieces.last_mut() {
            last.extend(texts[next_sentence..sentence_count].iter().cloned());
        }
    }

    pieces.iter().map(|p| join_pieces(p)).collect()
}

/// Cut `text` into `boundaries.len() + 1` parts.
///
/// `boundaries` are offsets into the source span of `source`. Each is moved
/// past the span's leading whitespace, scaled from the source text onto
/// `text` and snapped to the nearest whitespace not before the previous cut.
/// A boundary at or before the start of the source text gives an empty part,
/// one at or past its end leaves the rest in the current part. When no
/// whitespace is left the remainder stays in the current part and later
/// parts are empty.
fn split_at_boundaries(text: &str, source: &Sentence, boundaries: &[usize]) -> Vec<String> {
    if boundaries.is_empty() {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let source_len = source.text.chars().count();
    let mut parts = Vec::with_capacity(boundaries.len() + 1);
    let mut from = 0;

    for &boundary in boundaries {
        if boundary <= source.leading {
            parts.push(String::new());
            continue;
        }

        let offset = boundary - source.leading;
        if offset >= source_len {
            parts.push(collect_trimmed(&chars[from..]));
            from = total;
            continue;
        }

        let target = (offset * total + source_len / 2) / source_len;

        match nearest_whitespace(&chars, from, target) {
            Some(cut) => {
                parts.push(collect_trimmed(&chars[from..cut]));
                from = cut + 1;
            }
            None => {
                parts.push(collect_trimmed(&chars[from..]));
                from = total;
            }
        }
    }

    parts.push(collect_trimmed(&chars[from..]));
    parts
}

fn nearest_whitespace(chars: &[char], from: usize, target: usize) -> Option<usize> {
    let target = target.max(from);

    (from..chars.len())
        .filter(|&i| chars[i].is_whitespace())
        .min_by_key(|&i| (i.abs_diff(target), i))
}

fn collect_trimmed(chars: &[char]) -> String {
    chars.iter().collect::<String>().trim().to_string()
}

fn join_pieces(pieces: &[String]) -> String {
    pieces
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
