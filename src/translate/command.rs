//! Parsing of the manual translation chat command.
//!
//! `/tr <language code> <text>` translates `text` into the given language.

/// Invalid use of the translate command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Usage: {0} <language code> <text>")]
    Usage(String),
}

/// A parsed translate command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateCommand {
    pub target_language: String,
    pub text: String,
}

impl TranslateCommand {
    /// Whether `input` invokes `command` (first word matches exactly).
    #[must_use]
    pub fn matches(input: &str, command: &str) -> bool {
        input.split_whitespace().next() == Some(command)
    }

    /// Parse `input` as `<command> <language code> <text>`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Usage`] when the command is not followed by
    /// both a language code and some text.
    pub fn parse(input: &str, command: &str) -> Result<Self, CommandError> {
        let usage = || CommandError::Usage(command.to_string());

        let rest = input
            .trim()
            .strip_prefix(command)
            .filter(|r| r.is_empty() || r.starts_with(char::is_whitespace))
            .ok_or_else(usage)?
            .trim_start();

        let (language, text) = rest.split_once(char::is_whitespace).ok_or_else(usage)?;
        let text = text.trim();
        if language.is_empty() || text.is_empty() {
            return Err(usage());
        }

        Ok(Self {
            target_language: language.to_string(),
            text: text.to_string(),
        })
    }
}
