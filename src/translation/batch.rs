/*!
 * Batch submission payload and MT response parsing.
 *
 * The MT backend translates a plain-text file line by line, so the payload
 * holds exactly one line per sentence of the document, in document order.
 * Fully matched sentences are sent as empty lines: they keep their position
 * but cost no translation. The translated file is read back the same way.
 */

use bytes::Bytes;
use log::{debug, info};

use crate::errors::{PipelineError, SubmissionError};
use crate::providers::MachineTranslator;

use super::segmenter::Sentence;

/// Payload line for one sentence
fn payload_line(sentence: &Sentence) -> String {
    if sentence.has_full_match() {
        return String::new();
    }

    sentence.text.replace(['\r', '\n'], " ")
}

/// Build the newline-terminated payload for the given sentences
pub fn build_payload<'a, I>(sentences: I) -> String
where
    I: IntoIterator<Item = &'a Sentence>,
{
    sentences
        .into_iter()
        .map(|s| format!("{}\n", payload_line(s)))
        .collect()
}

/// Submit all sentences as one batch and return the backend's job id.
///
/// Fails with `SubmissionError::EmptyPayload` without contacting the backend
/// when there are no sentences.
pub async fn submit_batch(
    mt: &dyn MachineTranslator,
    sentences: &[Sentence],
    source: &str,
    target: &str,
) -> Result<String, SubmissionError> {
    if sentences.is_empty() {
        return Err(SubmissionError::EmptyPayload);
    }

    let payload = build_payload(sentences);
    let machine_lines = sentences.iter().filter(|s| !s.has_full_match()).count();
    debug!("Payload: {} lines, {} bytes", sentences.len(), payload.len());

    let job_id = mt.submit(source, target, Bytes::from(payload)).await?;

    info!(
        "Submitted {} sentences ({} for machine translation) as job {}",
        sentences.len(),
        machine_lines,
        job_id
    );

    Ok(job_id)
}

/// Split a translated file into one entry per sentence.
///
/// `sentences` is the document-ordered list the payload was built from. The
/// backend may drop trailing empty lines; those are restored only when every
/// missing position belongs to a full match.
pub fn parse_translated_lines(content: &[u8], sentences: &[Sentence]) -> Result<Vec<String>, PipelineError> {
    let text = String::from_utf8_lossy(content);
    let mut lines: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();

    let expected = sentences.len();
    if lines.len() < expected && sentences[lines.len()..].iter().all(Sentence::has_full_match) {
        debug!("Restoring {} trailing full-match placeholder line(s)", expected - lines.len());
        lines.resize(expected, String::new());
    }

    if lines.len() != expected {
        return Err(PipelineError::ReconstructionMismatch {
            expected,
            actual: lines.len(),
        });
    }

    Ok(lines)
}
