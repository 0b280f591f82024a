/*!
 * # csvbridge - mixed-encoding CSV normalizer and translator
 *
 * A Rust library that walks a directory tree of delimited text files whose
 * lines mix encodings, decodes every line on its own, translates Chinese
 * cells through a failover ring of translation services, and rewrites each
 * file in a canonical encoding with resumable checkpoints.
 *
 * ## Features
 *
 * - Per-line detection of UTF-8, GBK and ISO-8859-9
 * - Batched, cached translation with retry and backend failover
 * - Pass-through of the original text when every backend fails
 * - Per-batch checkpoints resuming an interrupted file mid-way
 * - Atomic replacement of the original file
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `encoding`: Encoding sniffer, mixed-encoding decoder and CJK detection
 * - `csv_codec`: Row parsing, serialisation and cell repair
 * - `translation`: Cache, orchestrator and progress reporting
 * - `providers`: Translation backend clients:
 *   - `providers::google`: Google web endpoint
 *   - `providers::mymemory`: MyMemory API
 *   - `providers::mock`: Scripted backend
 * - `progress_store`: Checkpoint persistence
 * - `pipeline`: Per-file state machine and driver
 * - `app_controller`: Directory run controller
 * - `file_utils`: File system operations
 * - `language_utils`: Language tag validation
 * - `logging`: Console and rotating-file logger
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod csv_codec;
pub mod encoding;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod logging;
pub mod pipeline;
pub mod progress_store;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use encoding::{EncodingName, MixedEncodingDecoder};
pub use errors::{CodecError, PipelineError, ProviderError};
pub use pipeline::{FileOutcome, FilePipeline, ShutdownSignal};
pub use translation::{TranslationCache, TranslationOrchestrator};
