/*!
 * Translation of CJK cell text.
 *
 * This module contains the translation layer used by the file pipeline.
 * It is split into several submodules:
 *
 * - `cache`: Run-wide memoization of translations
 * - `orchestrator`: Batching, retry and failover across backends
 * - `progress`: Progress context and observers
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, TranslationCache};
pub use self::orchestrator::{RetryPolicy, TranslationOrchestrator};
pub use self::progress::{LogObserver, ProgressObserver, ProgressUpdate, TranslationContext};

// Submodules
pub mod cache;
pub mod orchestrator;
pub mod progress;
