use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{error_for_status, http_client, TranslationBackend};

/// Client for the MyMemory translation API
#[derive(Debug)]
pub struct MyMemoryTranslator {
    /// HTTP client for API requests
    client: Client,
    /// `/get` URL
    endpoint: String,
    /// Contact address raising the daily quota
    email: Option<String>,
}

/// MyMemory response
#[derive(Debug, Deserialize)]
pub struct MyMemoryResponse {
    /// Best match
    #[serde(rename = "responseData")]
    pub response_data: MyMemoryData,
    /// Status code mirrored in the body
    #[serde(rename = "responseStatus", default)]
    pub response_status: Option<serde_json::Value>,
    /// Error details when the status is not 200
    #[serde(rename = "responseDetails", default)]
    pub response_details: Option<String>,
}

/// Translation payload of a MyMemory response
#[derive(Debug, Deserialize)]
pub struct MyMemoryData {
    /// The translated text
    #[serde(rename = "translatedText")]
    pub translated_text: Option<String>,
}

impl MyMemoryTranslator {
    /// Create a client for `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
            email: None,
        })
    }

    /// Attach a contact address to every request
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }

    async fn translate_one(&self, text: &str, langpair: &str) -> Result<String, ProviderError> {
        let mut query = vec![("q", text), ("langpair", langpair)];
        if let Some(email) = &self.email {
            query.push(("de", email.as_str()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await?;

        let body: MyMemoryResponse = error_for_status(response).await?.json().await?;
        extract_translation(body)
    }
}

/// Pull the translated text out of a response, honouring the in-body status
pub fn extract_translation(body: MyMemoryResponse) -> Result<String, ProviderError> {
    let status = body
        .response_status
        .as_ref()
        .and_then(|s| s.as_u64().or_else(|| s.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(200);

    if status != 200 {
        let message = body.response_details.unwrap_or_default();
        if status == 429 {
            return Err(ProviderError::RateLimitExceeded(message));
        }
        return Err(ProviderError::ApiError {
            status_code: u16::try_from(status).unwrap_or(500),
            message,
        });
    }

    body.response_data
        .translated_text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ProviderError::ParseError("Missing translatedText".to_string()))
}

#[async_trait]
impl TranslationBackend for MyMemoryTranslator {
    fn name(&self) -> &str {
        "mymemory"
    }

    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let langpair = format!("{}|{}", source_language, target_language);
        let mut translations = Vec::with_capacity(texts.len());
        for text in texts {
            translations.push(self.translate_one(text, &langpair).await?);
        }
        debug!("mymemory translated {} texts", translations.len());
        Ok(translations)
    }
}
