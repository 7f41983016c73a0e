//! HTTP client for a `LibreTranslate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::TranslateConfig;

use super::types::{Translation, TranslationRequest, TranslationResponse};

/// Overall request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from translation requests.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("The translation request timed out")]
    Timeout,
    #[error("Translation request failed: {0}")]
    RequestFailed(String),
    #[error("Translation endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse translation response: {0}")]
    ParseError(String),
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl TranslateError {
    fn from_send(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestFailed(e.to_string())
        }
    }
}

/// Anything that can translate a piece of text.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Language used by [`Translator::translate`].
    fn user_language(&self) -> &str;

    /// Translate `text` into `target`.
    async fn translate_to(&self, text: &str, target: &str) -> Result<Translation, TranslateError>;

    /// Translate `text` into the user's language.
    async fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        self.translate_to(text, self.user_language()).await
    }
}

/// Client for the `LibreTranslate` `/translate` endpoint.
#[derive(Debug, Clone)]
pub struct LibreTranslateClient {
    client: Client,
    api_url: String,
    user_language: String,
}

impl LibreTranslateClient {
    /// Create a client with the standard request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Client`] if the HTTP client cannot be built.
    pub fn new(api_url: String, user_language: String) -> Result<Self, TranslateError> {
        Self::with_timeout(api_url, user_language, REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Client`] if the HTTP client cannot be built.
    pub fn with_timeout(
        api_url: String,
        user_language: String,
        timeout: Duration,
    ) -> Result<Self, TranslateError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::Client(e.to_string()))?;
        Ok(Self {
            client,
            api_url,
            user_language,
        })
    }

    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &TranslateConfig) -> Result<Self, TranslateError> {
        Self::new(config.api_url.clone(), config.user_language.clone())
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl Translator for LibreTranslateClient {
    fn user_language(&self) -> &str {
        &self.user_language
    }

    async fn translate_to(&self, text: &str, target: &str) -> Result<Translation, TranslateError> {
        let body = TranslationRequest::auto(text, target);

        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslateError::from_send(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TranslateError::from_send(&e))?;
        let parsed: TranslationResponse =
            serde_json::from_str(&text).map_err(|e| TranslateError::ParseError(e.to_string()))?;

        let translation = Translation::new(parsed, target);
        tracing::debug!(
            source = translation.source_language().unwrap_or("?"),
            target,
            success = translation.is_success(),
            "Translation received"
        );
        Ok(translation)
    }
}
