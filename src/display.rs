//! Colored terminal output for chat and translations.

use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

use crate::translate::Translation;
use crate::watcher::{ChatChannel, ChatEvent};

/// Longest sender name shown before truncation.
const MAX_SENDER_LEN: usize = 24;

/// Local wall-clock time of an event, `HH:MM:SS`.
fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Truncate a string to `max_chars` characters, adding an ellipsis if cut.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_chars - 3).collect();
        format!("{kept}...")
    }
}

/// Uncolored `[channel] sender: message` text.
#[must_use]
pub fn format_chat(event: &ChatEvent) -> String {
    format!(
        "[{}] {}: {}",
        event.channel,
        truncate(&event.from, MAX_SENDER_LEN),
        event.message
    )
}

/// Print a received chat message.
pub fn print_chat(event: &ChatEvent) {
    let label = format!("[{}]", event.channel);
    let label = match event.channel {
        ChatChannel::Wing => label.green().bold().to_string(),
        ChatChannel::Local => label.cyan().bold().to_string(),
        ChatChannel::Friend => label.magenta().bold().to_string(),
        ChatChannel::Player => label.yellow().bold().to_string(),
    };
    println!(
        "{} {} {}: {}",
        clock(event.received_at).dimmed(),
        label,
        truncate(&event.from, MAX_SENDER_LEN).bold(),
        event.message
    );
    let _ = io::stdout().flush();
}

/// Print a successful translation under the message it belongs to.
pub fn print_translation(translation: &Translation) {
    println!("         {}", translation.render().blue());
    let _ = io::stdout().flush();
}

/// Print the name of a newly selected journal file.
pub fn print_new_journal(file_name: &str) {
    println!("{} {}", "[JOURNAL]".blue().bold(), file_name.dimmed());
    let _ = io::stdout().flush();
}

/// Print an informational message.
pub fn print_info(message: &str) {
    println!("{} {}", "[INFO]".blue().bold(), message);
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stdout().flush();
}
