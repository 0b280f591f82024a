/*!
 * Translation backends.
 *
 * This module contains client implementations for the translation services
 * making up the failover ring:
 * - Google: public web translation endpoint
 * - MyMemory: MyMemory translation API
 * - Mock: scripted backend for tests and dry runs
 */

use async_trait::async_trait;
use log::info;
use std::fmt::Debug;
use std::time::Duration;

use crate::app_config::{BackendKind, TranslationConfig};
use crate::errors::ProviderError;

/// Common trait for all translation backends
///
/// A backend either translates every text it is given or fails; retrying and
/// failing over is left to the caller.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Translate `texts` from `source_language` to `target_language`
    ///
    /// # Returns
    /// * `Result<Vec<String>, ProviderError>` - One translation per input text, in order
    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Build the enabled backends of `config`, in ring order
pub fn build_backends(
    config: &TranslationConfig,
) -> Result<Vec<Box<dyn TranslationBackend>>, ProviderError> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    let mut backends: Vec<Box<dyn TranslationBackend>> = Vec::new();

    for backend in config.enabled_backends() {
        let endpoint = backend.get_endpoint();
        let built: Box<dyn TranslationBackend> = match backend.kind {
            BackendKind::Google => Box::new(google::GoogleWebTranslator::new(endpoint, timeout)?),
            BackendKind::MyMemory => Box::new(
                mymemory::MyMemoryTranslator::new(endpoint, timeout)?
                    .with_email(backend.email.clone()),
            ),
        };
        backends.push(built);
    }

    info!(
        "Translation backends: [{}]",
        backends
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(backends)
}

/// Build an HTTP client with the request timeout applied
fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| ProviderError::Unavailable(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success response into a `ProviderError`
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message: String = message.chars().take(200).collect();

    if status.as_u16() == 429 {
        return Err(ProviderError::RateLimitExceeded(message));
    }
    Err(ProviderError::ApiError {
        status_code: status.as_u16(),
        message,
    })
}

pub mod google;
pub mod mock;
pub mod mymemory;
