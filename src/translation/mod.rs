/*!
 * Sentence-level translation of layout documents.
 *
 * - `segmenter`: sentence boundary detection in region text
 * - `sentences`: per-region sentence snapshot of a document
 * - `full_match`: translation-memory full-match lookups
 * - `batch`: MT payload building and response parsing
 * - `reconstruct`: putting translated sentences back onto lines
 * - `orchestrator`: the submit/retrieve job pipeline
 */

pub use self::full_match::FullMatchResolver;
pub use self::orchestrator::{RetrieveOutcome, SubmitRequest, TranslatedDocument, TranslationOrchestrator};
pub use self::reconstruct::OverflowPolicy;
pub use self::segmenter::{Sentence, SentenceSegmenter};
pub use self::sentences::SentenceSnapshot;

pub mod batch;
pub mod full_match;
pub mod orchestrator;
pub mod reconstruct;
pub mod segmenter;
pub mod sentences;
