//! Configuration types.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Journal tailing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Tail the journal directory at all.
    pub enabled: bool,
    /// Journal directory. `%VAR%`, `$VAR` and `${VAR}` are expanded.
    pub directory: String,
    /// Poll timer period in milliseconds.
    pub poll_interval_ms: u64,
    /// Log skipped lines and trigger outcomes.
    pub debug_logging: bool,
}

fn default_journal_directory() -> String {
    r"%USERPROFILE%\Saved Games\Frontier Developments\Elite Dangerous".to_string()
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_journal_directory(),
            poll_interval_ms: 1000,
            debug_logging: false,
        }
    }
}

/// Translation endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// `LibreTranslate` `/translate` endpoint.
    pub api_url: String,
    /// Language chat is translated into.
    pub user_language: String,
    /// Chat command prefix for manual translations.
    pub command: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            api_url: "http://192.168.1.10:5000/translate".to_string(),
            user_language: "EN".to_string(),
            command: "/tr".to_string(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub journal: JournalConfig,
    pub translate: TranslateConfig,
}

impl Config {
    /// Check values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if the API URL is not an
    /// absolute http(s) URL, or [`ConfigError::Invalid`] for an empty
    /// language or command.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.translate.api_url).map_err(|e| {
            ConfigError::InvalidApiUrl {
                url: self.translate.api_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                url: self.translate.api_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.translate.user_language.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "translate.user_language is empty".to_string(),
            ));
        }
        if self.translate.command.trim().is_empty() {
            return Err(ConfigError::Invalid("translate.command is empty".to_string()));
        }
        Ok(())
    }
}
