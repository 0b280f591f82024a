use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{error_for_status, http_client, TranslationBackend};

/// Client for the public Google web translation endpoint
///
/// The endpoint takes one text per request, so a batch is sent as a
/// sequence of requests and fails as a whole on the first error.
#[derive(Debug)]
pub struct GoogleWebTranslator {
    /// HTTP client for API requests
    client: Client,
    /// `translate_a/single` URL
    endpoint: String,
}

impl GoogleWebTranslator {
    /// Create a client for `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    async fn translate_one(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let body: Value = error_for_status(response).await?.json().await?;
        parse_response(&body)
    }
}

/// Concatenate the translated segments of a `translate_a/single` response
///
/// The payload is `[[["seg1", "src1", ...], ["seg2", "src2", ...]], ...]`.
pub fn parse_response(body: &Value) -> Result<String, ProviderError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::ParseError("Missing translation segments".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(ProviderError::ParseError(
            "Empty translation in response".to_string(),
        ));
    }
    Ok(translated)
}

#[async_trait]
impl TranslationBackend for GoogleWebTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let mut translations = Vec::with_capacity(texts.len());
        for text in texts {
            translations.push(
                self.translate_one(text, source_language, target_language)
                    .await?,
            );
        }
        debug!("google translated {} texts", translations.len());
        Ok(translations)
    }
}
