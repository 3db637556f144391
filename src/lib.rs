/*!
 * # pagetrans - layout-preserving document translation
 *
 * A Rust library that translates documents made of text regions and lines
 * through a machine translation web service, and writes the translation back
 * onto the original lines.
 *
 * ## Features
 *
 * - Sentence segmentation of every text region
 * - Translation memory lookups: full matches are reused instead of machine translated
 * - Asynchronous eTranslation jobs: submit now, retrieve later
 * - Job persistence in SQLite so that retrieval survives a restart
 * - Reconstruction of translated sentences onto the original line structure
 * - JSON and PAGE XML documents
 * - Translation memory maintenance (units, TMX import)
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Wiring of config, backends and job storage for the CLI
 * - `layout`: Region/line document model, JSON and PAGE XML
 * - `translation`: The translation pipeline:
 *   - `translation::segmenter`: Sentence boundary detection
 *   - `translation::full_match`: Translation memory full matches
 *   - `translation::batch`: MT payload building and parsing
 *   - `translation::reconstruct`: Putting sentences back onto lines
 *   - `translation::orchestrator`: Submit/retrieve job flow
 * - `providers`: Clients for the backends:
 *   - `providers::etranslation`: eTranslation document API
 *   - `providers::mouse_tm`: Translation memory lookup API
 *   - `providers::mock`: In-process backends for tests
 * - `database`: Job storage
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod layout;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{JobStore, MemoryJobStore, Repository};
pub use errors::{PipelineError, ProviderError, StoreError, SubmissionError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part1};
pub use layout::{LayoutDocument, LayoutLine, LayoutRegion};
pub use translation::{RetrieveOutcome, SubmitRequest, TranslatedDocument, TranslationOrchestrator};
