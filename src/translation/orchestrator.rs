/*!
 * Batched, cache-backed translation with retry and failover.
 *
 * The orchestrator is the only place that retries or switches backends. Given
 * an ordered list of cell texts it returns a list of the same length where
 * every entry is either the original text or its translation:
 *
 * 1. texts without CJK content are returned verbatim;
 * 2. cached texts are answered from the cache;
 * 3. the remaining distinct texts are sent in chunks to the current backend,
 *    retried on retryable errors, then handed to the next backend of the ring;
 * 4. when every backend fails the chunk's texts are kept untranslated.
 *
 * Every resolved pair, including pass-through fallbacks, is cached so a
 * string always maps to the same output within a run.
 */

use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::app_config::Config;
use crate::encoding::script::needs_translation;
use crate::errors::ProviderError;
use crate::providers::TranslationBackend;
use crate::translation::cache::TranslationCache;
use crate::translation::progress::{ProgressObserver, ProgressUpdate, TranslationContext};

/// Attempts per backend and pause between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Calls made to one backend before failing over
    pub attempts: u32,
    /// Pause between two attempts on the same backend
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(3),
        }
    }
}

/// Translation orchestrator over a failover ring of backends
#[derive(Debug)]
pub struct TranslationOrchestrator {
    /// Failover ring, in configured order
    backends: Vec<Box<dyn TranslationBackend>>,

    /// Run-wide translation cache
    cache: TranslationCache,

    /// Per-backend retry policy
    retry: RetryPolicy,

    /// Minimum spacing between two backend calls
    request_delay: Duration,

    /// Upper bound of texts in one backend call
    max_texts_per_request: usize,

    /// Source language code
    source_language: String,

    /// Target language code
    target_language: String,

    /// Time of the last backend call
    last_request: Option<Instant>,
}

impl TranslationOrchestrator {
    /// Create an orchestrator with default retry and no request spacing
    pub fn new(backends: Vec<Box<dyn TranslationBackend>>, cache: TranslationCache) -> Self {
        Self {
            backends,
            cache,
            retry: RetryPolicy::default(),
            request_delay: Duration::ZERO,
            max_texts_per_request: 100,
            source_language: "zh-CN".to_string(),
            target_language: "en".to_string(),
            last_request: None,
        }
    }

    /// Create an orchestrator configured from `config`
    pub fn from_config(
        config: &Config,
        backends: Vec<Box<dyn TranslationBackend>>,
        cache: TranslationCache,
    ) -> Self {
        let translation = &config.translation;
        Self::new(backends, cache)
            .with_languages(&config.source_language, &config.target_language)
            .with_retry(RetryPolicy {
                attempts: translation.retry_count,
                delay: Duration::from_millis(translation.retry_delay_ms),
            })
            .with_request_delay(Duration::from_millis(translation.request_delay_ms))
            .with_max_texts_per_request(translation.max_texts_per_request)
    }

    /// Set the language pair
    pub fn with_languages(mut self, source: &str, target: &str) -> Self {
        self.source_language = source.to_string();
        self.target_language = target.to_string();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the minimum spacing between backend calls
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Set the chunk size of backend calls
    pub fn with_max_texts_per_request(mut self, max: usize) -> Self {
        self.max_texts_per_request = max.max(1);
        self
    }

    /// The run-wide cache
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Translate `texts`, preserving length and order
    pub async fn translate_texts(
        &mut self,
        texts: &[String],
        context: &TranslationContext,
        observer: &dyn ProgressObserver,
    ) -> Vec<String> {
        let mut output = texts.to_vec();

        // Distinct cache misses in first-seen order, with every position they fill
        let mut misses: Vec<String> = Vec::new();
        let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();

        for (index, text) in texts.iter().enumerate() {
            if !needs_translation(text) {
                continue;
            }
            if let Some(slots) = positions.get_mut(text.as_str()) {
                slots.push(index);
                continue;
            }
            if let Some(hit) = self.cache.get(text, &self.source_language, &self.target_language) {
                output[index] = hit;
                continue;
            }
            positions.insert(text.as_str(), vec![index]);
            misses.push(text.clone());
        }

        let chunks: Vec<&[String]> = misses.chunks(self.max_texts_per_request).collect();
        let chunk_count = chunks.len();

        if chunk_count == 0 {
            observer.progress(&ProgressUpdate::from_context(context, 0, 0));
            return output;
        }

        for (chunk_index, chunk) in chunks.into_iter().enumerate() {
            let translations = match self.translate_chunk(chunk).await {
                Some(translations) => translations,
                None => chunk.to_vec(),
            };

            for (source, translated) in chunk.iter().zip(translations) {
                self.cache
                    .store(source, &self.source_language, &self.target_language, &translated);
                if let Some(slots) = positions.get(source.as_str()) {
                    for &slot in slots {
                        output[slot] = translated.clone();
                    }
                }
            }

            observer.progress(&ProgressUpdate::from_context(
                context,
                chunk_index + 1,
                chunk_count,
            ));
        }

        output
    }

    /// Try every backend of the ring in order, primary first
    async fn translate_chunk(&mut self, texts: &[String]) -> Option<Vec<String>> {
        let ring = self.backends.len();
        if ring == 0 {
            debug!("No translation backends configured, keeping {} texts", texts.len());
            return None;
        }

        for index in 0..ring {
            match self.call_with_retry(index, texts).await {
                Ok(translations) => {
                    if index > 0 {
                        info!("Failed over to translation backend {}", self.backends[index].name());
                    }
                    return Some(translations);
                }
                Err(e) => {
                    warn!(
                        "Backend {} gave up on {} texts: {}",
                        self.backends[index].name(),
                        texts.len(),
                        e
                    );
                }
            }
        }

        error!(
            "All translation backends failed for {} texts; keeping the original text",
            texts.len()
        );
        None
    }

    /// Call one backend up to the retry bound
    async fn call_with_retry(&mut self, index: usize, texts: &[String]) -> Result<Vec<String>, ProviderError> {
        let attempts = self.retry.attempts.max(1);
        let mut last_error = ProviderError::Unavailable("no attempt made".to_string());

        for attempt in 1..=attempts {
            self.wait_for_request_slot().await;

            let backend = &self.backends[index];
            let result = backend
                .translate(texts, &self.source_language, &self.target_language)
                .await
                .and_then(|translations| {
                    if translations.len() == texts.len() {
                        Ok(translations)
                    } else {
                        Err(ProviderError::CountMismatch {
                            expected: texts.len(),
                            got: translations.len(),
                        })
                    }
                });

            match result {
                Ok(translations) => return Ok(translations),
                Err(e) => {
                    warn!(
                        "Translation attempt {}/{} with {} failed: {}",
                        attempt,
                        attempts,
                        backend.name(),
                        e
                    );
                    let retryable = e.is_retryable();
                    last_error = e;
                    if !retryable {
                        break;
                    }
                    if attempt < attempts && !self.retry.delay.is_zero() {
                        sleep(self.retry.delay).await;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Keep backend calls at least `request_delay` apart
    async fn wait_for_request_slot(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.request_delay {
                sleep(self.request_delay - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}
