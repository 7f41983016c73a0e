//! Translation of chat text through a `LibreTranslate` endpoint.

mod client;
mod command;
mod types;

pub use client::{LibreTranslateClient, TranslateError, Translator, REQUEST_TIMEOUT};
pub use command::{CommandError, TranslateCommand};
pub use types::{DetectedLanguage, Translation, TranslationRequest, TranslationResponse};
