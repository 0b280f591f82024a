/*!
 * Mock backend implementations for testing.
 *
 * This module provides a scripted backend that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::intermittent(n)` - Fails every nth request
 * - `MockProvider::failing()` - Always fails with a retryable error
 * - `MockProvider::unavailable()` - Always fails with a non-retryable error
 * - `MockProvider::wrong_count()` - Returns one translation too few
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::TranslationBackend;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with a retryable error
    Failing,
    /// Fails the first `failures` requests, then works
    Recovering { failures: usize },
    /// Always fails with a non-retryable error
    Unavailable,
    /// Returns one translation fewer than requested
    WrongCount,
}

/// Mock backend for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Name reported in logs
    name: String,
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every text received, in order, shared between clones
    received: Arc<Mutex<Vec<String>>>,
    /// Custom translation function (optional)
    custom_response: Option<fn(&str, &str) -> String>,
}

impl MockProvider {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            name: "mock".to_string(),
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a mock backend that fails `failures` times before working
    pub fn recovering(failures: usize) -> Self {
        Self::new(MockBehavior::Recovering { failures })
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock backend that is never usable
    pub fn unavailable() -> Self {
        Self::new(MockBehavior::Unavailable)
    }

    /// Create a mock that drops the last translation of every batch
    pub fn wrong_count() -> Self {
        Self::new(MockBehavior::WrongCount)
    }

    /// Rename the backend
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set a custom translation function taking `(text, target_language)`
    pub fn with_custom_response(mut self, generator: fn(&str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of `translate` calls made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Every text received so far
    pub fn received_texts(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Default translation produced by a working mock
    pub fn default_translation(text: &str, target_language: &str) -> String {
        format!("[TRANSLATED to {}] {}", target_language, text)
    }

    fn render(&self, texts: &[String], target_language: &str) -> Vec<String> {
        let generator = self.custom_response.unwrap_or(Self::default_translation);
        texts
            .iter()
            .map(|text| generator(text, target_language))
            .collect()
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            received: Arc::clone(&self.received),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl TranslationBackend for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.received.lock().extend(texts.iter().cloned());

        match self.behavior {
            MockBehavior::Working => Ok(self.render(texts, target_language)),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.render(texts, target_language))
                }
            }

            MockBehavior::Recovering { failures } if count >= failures => {
                Ok(self.render(texts, target_language))
            }

            MockBehavior::Failing | MockBehavior::Recovering { .. } => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Unavailable => Err(ProviderError::Unavailable(
                "Simulated unavailable backend".to_string(),
            )),

            MockBehavior::WrongCount => {
                let mut translations = self.render(texts, target_language);
                translations.pop();
                Ok(translations)
            }
        }
    }
}
