//! Decoder for Elite Dangerous journal lines.
//!
//! Each journal line is an independent JSON object. Only `ReceiveText`
//! records on player-facing channels are surfaced; every other line decodes
//! to `None`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Journal event kind carrying received chat.
pub const RECEIVE_TEXT_EVENT: &str = "ReceiveText";

/// Chat channels that are forwarded to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatChannel {
    Wing,
    Local,
    Friend,
    Player,
}

impl ChatChannel {
    /// Lowercase name as written in the journal.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wing => "wing",
            Self::Local => "local",
            Self::Friend => "friend",
            Self::Player => "player",
        }
    }
}

impl fmt::Display for ChatChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel string that is not one of the forwarded channels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported chat channel: {0}")]
pub struct UnsupportedChannel(pub String);

impl FromStr for ChatChannel {
    type Err = UnsupportedChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wing" => Ok(Self::Wing),
            "local" => Ok(Self::Local),
            "friend" => Ok(Self::Friend),
            "player" => Ok(Self::Player),
            _ => Err(UnsupportedChannel(s.to_string())),
        }
    }
}

/// A chat message received in game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub channel: ChatChannel,
    /// Sender name as written in the `From` field.
    pub from: String,
    pub message: String,
    /// Wall-clock time the line was decoded. The journal's own `timestamp`
    /// field is not used.
    pub received_at: DateTime<Utc>,
}

/// The only fields read from a journal record. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct RawLogRecord {
    event: Option<String>,
    #[serde(rename = "Channel")]
    channel: Option<String>,
    #[serde(rename = "From")]
    from: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

/// Why a line did not produce a [`ChatEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// Blank line.
    Empty,
    /// Not a JSON object with the expected field types.
    Malformed(String),
    /// Some other event kind.
    OtherEvent,
    /// `ReceiveText` without `Channel`, `From` or `Message`.
    MissingField(&'static str),
    /// `ReceiveText` on a channel that is not forwarded.
    Channel(String),
}

/// Decode one journal line, reporting why it was skipped.
///
/// # Errors
///
/// Returns the [`Skip`] reason when the line is not a forwarded chat message.
pub fn try_decode_line(line: &str) -> Result<ChatEvent, Skip> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(Skip::Empty);
    }
    // serde would otherwise accept a positional array for the record struct
    if !trimmed.starts_with('{') {
        return Err(Skip::Malformed("not a JSON object".to_string()));
    }

    let record: RawLogRecord =
        serde_json::from_str(trimmed).map_err(|e| Skip::Malformed(e.to_string()))?;

    if record.event.as_deref() != Some(RECEIVE_TEXT_EVENT) {
        return Err(Skip::OtherEvent);
    }

    let channel = record.channel.ok_or(Skip::MissingField("Channel"))?;
    let from = record.from.ok_or(Skip::MissingField("From"))?;
    let message = record.message.ok_or(Skip::MissingField("Message"))?;

    let channel = channel
        .parse::<ChatChannel>()
        .map_err(|UnsupportedChannel(c)| Skip::Channel(c))?;

    Ok(ChatEvent {
        channel,
        from,
        message,
        received_at: Utc::now(),
    })
}

/// Decode one journal line into a chat event, or `None` if it is not one.
#[must_use]
pub fn decode_line(line: &str) -> Option<ChatEvent> {
    try_decode_line(line).ok()
}
