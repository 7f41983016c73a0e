//! Journal Translator - tails Elite Dangerous journals and translates chat.

pub mod config;
pub mod display;
pub mod translate;
pub mod watcher;
