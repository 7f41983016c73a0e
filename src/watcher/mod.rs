//! Journal tailer for Elite Dangerous.
//!
//! Follows the newest `Journal.*.log` file in a directory, decodes each
//! completed line and publishes received chat to subscribers.

mod controller;
mod discovery;
mod error;
mod expand;
mod journal;
mod journal_watcher;
mod subscribers;
mod tailer;
mod triggers;

pub use controller::{TailerController, TailerState, TriggerOutcome};
pub use discovery::{CandidateFile, DirectoryScanner, JOURNAL_PATTERN};
pub use error::WatcherError;
pub use expand::{expand_dir, expand_env_vars, expand_with};
pub use journal::{
    decode_line, try_decode_line, ChatChannel, ChatEvent, Skip, UnsupportedChannel,
    RECEIVE_TEXT_EVENT,
};
pub use journal_watcher::{JournalWatcher, TailerOptions};
pub use subscribers::{SubscriptionId, Subscribers};
pub use tailer::{split_complete_lines, FileTailer};
pub use triggers::{is_relevant, TriggerSources, DEFAULT_POLL_INTERVAL};
