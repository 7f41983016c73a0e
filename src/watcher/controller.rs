//! Tailer state machine.
//!
//! Glues the scanner, the file tailer and the line decoder together. Every
//! trigger runs the whole resolve, open, read, decode and dispatch sequence
//! under one lock, so concurrent triggers cannot double-open a rotated file
//! or interleave cursor updates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::discovery::{CandidateFile, DirectoryScanner};
use super::expand::expand_dir;
use super::journal::{try_decode_line, ChatEvent, Skip};
use super::subscribers::{SubscriptionId, Subscribers};
use super::tailer::FileTailer;

/// Lifecycle state of a [`TailerController`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TailerState {
    #[default]
    Stopped,
    /// Running, but no journal file found yet.
    Idle,
    /// Running and bound to an active journal file.
    Tailing,
}

/// What a single trigger did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerOutcome {
    /// A new active file was selected during this trigger.
    pub rotated: bool,
    /// Chat events dispatched during this trigger.
    pub events: usize,
}

/// The journal currently being tailed.
#[derive(Debug)]
struct ActiveFile {
    name: String,
    tailer: FileTailer,
}

#[derive(Debug, Default)]
struct ControllerState {
    status: TailerState,
    active: Option<ActiveFile>,
}

#[derive(Debug)]
struct Shared {
    scanner: DirectoryScanner,
    debug_logging: bool,
    state: Mutex<ControllerState>,
    chat: Subscribers<ChatEvent>,
    new_file: Subscribers<String>,
}

/// Serialised controller for one journal directory.
///
/// Cheap to clone; clones share state and subscribers.
#[derive(Debug, Clone)]
pub struct TailerController {
    shared: Arc<Shared>,
}

impl TailerController {
    /// Create a stopped controller for `scanner`'s directory.
    #[must_use]
    pub fn new(scanner: DirectoryScanner, debug_logging: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                scanner,
                debug_logging,
                state: Mutex::new(ControllerState::default()),
                chat: Subscribers::new(),
                new_file: Subscribers::new(),
            }),
        }
    }

    /// Create a controller for a configured directory string.
    ///
    /// Environment variables in `directory` are expanded once, here.
    #[must_use]
    pub fn for_directory(directory: &str, debug_logging: bool) -> Self {
        Self::new(DirectoryScanner::new(expand_dir(directory)), debug_logging)
    }

    /// Directory being watched.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.shared.scanner.dir()
    }

    #[must_use]
    pub fn scanner(&self) -> &DirectoryScanner {
        &self.shared.scanner
    }

    /// Register a callback for decoded chat events.
    pub fn subscribe_chat<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChatEvent) + Send + Sync + 'static,
    {
        self.shared.chat.subscribe(callback)
    }

    pub fn unsubscribe_chat(&self, id: SubscriptionId) -> bool {
        self.shared.chat.unsubscribe(id)
    }

    /// Register a callback for newly selected journal file names.
    pub fn subscribe_new_file<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        self.shared.new_file.subscribe(callback)
    }

    pub fn unsubscribe_new_file(&self, id: SubscriptionId) -> bool {
        self.shared.new_file.unsubscribe(id)
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> TailerState {
        self.shared.state.lock().await.status
    }

    /// Name of the active journal file.
    pub async fn latest_file_name(&self) -> Option<String> {
        let state = self.shared.state.lock().await;
        state.active.as_ref().map(|a| a.name.clone())
    }

    /// Full path of the active journal file.
    pub async fn latest_file_path(&self) -> Option<PathBuf> {
        self.latest_file_name()
            .await
            .map(|name| self.directory().join(name))
    }

    /// Byte cursor into the active journal file.
    pub async fn cursor(&self) -> Option<u64> {
        let state = self.shared.state.lock().await;
        state.active.as_ref().map(|a| a.tailer.offset())
    }

    /// Start tailing: scan once and emit the newest file's backlog.
    ///
    /// Does nothing if already started.
    pub async fn start(&self) -> TriggerOutcome {
        let mut state = self.shared.state.lock().await;
        if state.status != TailerState::Stopped {
            return TriggerOutcome::default();
        }
        tracing::info!(dir = %self.directory().display(), "Starting journal tailer");
        state.status = TailerState::Idle;
        self.run_cycle(&mut state).await
    }

    /// Re-evaluate the directory and deliver any new chat events.
    ///
    /// A no-op once stopped.
    pub async fn trigger(&self) -> TriggerOutcome {
        let mut state = self.shared.state.lock().await;
        if state.status == TailerState::Stopped {
            return TriggerOutcome::default();
        }
        let outcome = self.run_cycle(&mut state).await;
        if self.shared.debug_logging && outcome != TriggerOutcome::default() {
            tracing::debug!(
                rotated = outcome.rotated,
                events = outcome.events,
                "Trigger processed"
            );
        }
        outcome
    }

    /// Queue a trigger on the runtime without waiting for it.
    pub fn check_now(&self) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.trigger().await;
        });
    }

    /// Stop tailing and close the active file.
    ///
    /// Waits for an in-flight trigger to finish first.
    pub async fn stop(&self) {
        let mut state = self.shared.state.lock().await;
        if state.status == TailerState::Stopped {
            return;
        }
        state.status = TailerState::Stopped;
        state.active = None;
        tracing::info!(dir = %self.directory().display(), "Journal tailer stopped");
    }

    async fn run_cycle(&self, state: &mut ControllerState) -> TriggerOutcome {
        let current = state.active.as_ref().map(|a| a.name.as_str());

        if let Some(candidate) = self.shared.scanner.rescan(current) {
            // Lines completed in the outgoing file since the last read come
            // before the new file's backlog.
            let mut events = self.read_and_dispatch(state).await;
            if self.switch_to(state, &candidate).await {
                events += self.read_and_dispatch(state).await;
                self.shared.new_file.dispatch(&candidate.name);
                return TriggerOutcome {
                    rotated: true,
                    events,
                };
            }
            return TriggerOutcome {
                rotated: false,
                events,
            };
        }

        TriggerOutcome {
            rotated: false,
            events: self.read_and_dispatch(state).await,
        }
    }

    /// Replace the active file with `candidate`, cursor at 0.
    ///
    /// On failure the previous file (if any) stays active.
    async fn switch_to(&self, state: &mut ControllerState, candidate: &CandidateFile) -> bool {
        let tailer = match FileTailer::open(candidate.path.clone()).await {
            Ok(tailer) => tailer,
            Err(e) => {
                tracing::warn!(
                    path = %candidate.path.display(),
                    error = %e,
                    "Failed to open journal file, will retry on next trigger"
                );
                return false;
            }
        };

        if let Some(previous) = state.active.take() {
            tracing::debug!(file = %previous.name, "Closing rotated journal file");
        }
        tracing::info!(file = %candidate.name, "Tailing journal file");

        state.active = Some(ActiveFile {
            name: candidate.name.clone(),
            tailer,
        });
        state.status = TailerState::Tailing;
        true
    }

    async fn read_and_dispatch(&self, state: &mut ControllerState) -> usize {
        let Some(active) = state.active.as_mut() else {
            return 0;
        };

        let lines = match active.tailer.read_new_lines().await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(
                    file = %active.name,
                    error = %e,
                    "Failed to read journal file, skipping this trigger"
                );
                return 0;
            }
        };

        let mut dispatched = 0;
        for line in &lines {
            match try_decode_line(line) {
                Ok(event) => {
                    self.shared.chat.dispatch(&event);
                    dispatched += 1;
                }
                Err(Skip::OtherEvent | Skip::Empty) => {}
                Err(skip) => {
                    if self.shared.debug_logging {
                        tracing::debug!(file = %active.name, reason = ?skip, "Skipped journal line");
                    }
                }
            }
        }
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, OpenOptions};
    use std::io::Write;
    use std::sync::Mutex as StdMutex;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    use crate::watcher::ChatChannel;

    fn chat(channel: &str, from: &str, message: &str) -> String {
        format!(
            r#"{{"timestamp":"2024-01-01T00:00:00Z","event":"ReceiveText","From":"{from}","Message":"{message}","Channel":"{channel}"}}"#
        )
    }

    fn write_journal(dir: &Path, name: &str, lines: &[String], mtime_secs: u64) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        set_mtime(&path, mtime_secs);
        path
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = OpenOptions::new().append(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs))
            .unwrap();
    }

    fn append(path: &Path, text: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    fn recording(controller: &TailerController) -> Arc<StdMutex<Vec<ChatEvent>>> {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.subscribe_chat(move |e| sink.lock().unwrap().push(e.clone()));
        seen
    }

    fn controller_for(dir: &TempDir) -> TailerController {
        TailerController::new(DirectoryScanner::new(dir.path().to_path_buf()), true)
    }

    #[tokio::test]
    async fn test_start_without_journal_stays_idle() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller_for(&temp_dir);

        let outcome = controller.start().await;
        assert_eq!(outcome, TriggerOutcome::default());
        assert_eq!(controller.state().await, TailerState::Idle);
        assert!(controller.latest_file_name().await.is_none());
    }

    #[tokio::test]
    async fn test_start_in_missing_directory_is_not_fatal() {
        let controller = TailerController::new(
            DirectoryScanner::new(PathBuf::from("/nonexistent/journal-dir-54321")),
            false,
        );
        controller.start().await;
        assert_eq!(controller.state().await, TailerState::Idle);
        assert_eq!(controller.trigger().await, TriggerOutcome::default());
    }

    #[tokio::test]
    async fn test_start_emits_backlog_once() {
        let temp_dir = TempDir::new().unwrap();
        write_journal(
            temp_dir.path(),
            "Journal.2024-01-01T000000.01.log",
            &[
                chat("local", "Cmdr A", "bonjour"),
                r#"{"timestamp":"2024-01-01T00:00:01Z","event":"Music","MusicTrack":"NoTrack"}"#
                    .to_string(),
            ],
            1,
        );
        let controller = controller_for(&temp_dir);
        let seen = recording(&controller);

        let outcome = controller.start().await;
        assert!(outcome.rotated);
        assert_eq!(outcome.events, 1);
        assert_eq!(controller.state().await, TailerState::Tailing);

        let events = seen.lock().unwrap().clone();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel, ChatChannel::Local);

        // No growth, nothing new.
        assert_eq!(controller.trigger().await, TriggerOutcome::default());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_appended_lines_are_delivered_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_journal(temp_dir.path(), "Journal.A.log", &[], 1);
        let controller = controller_for(&temp_dir);
        let seen = recording(&controller);
        controller.start().await;

        let text: String = (0..5)
            .map(|i| chat("wing", "Cmdr B", &format!("m{i}")) + "\n")
            .collect();
        append(&path, &text);

        assert_eq!(controller.trigger().await.events, 5);
        let messages: Vec<String> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect();
        assert_eq!(messages, vec!["m0", "m1", "m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_partial_line_is_delivered_after_completion() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_journal(temp_dir.path(), "Journal.A.log", &[], 1);
        let controller = controller_for(&temp_dir);
        let seen = recording(&controller);
        controller.start().await;

        let line = chat("friend", "Cmdr C", "salut");
        let (head, tail) = line.split_at(20);
        append(&path, head);
        assert_eq!(controller.trigger().await.events, 0);
        assert_eq!(controller.cursor().await, Some(0));

        append(&path, &format!("{tail}\n"));
        assert_eq!(controller.trigger().await.events, 1);
        assert_eq!(seen.lock().unwrap()[0].message, "salut");
    }

    #[tokio::test]
    async fn test_rotation_switches_to_newer_file_and_reads_backlog() {
        let temp_dir = TempDir::new().unwrap();
        write_journal(
            temp_dir.path(),
            "Journal.2024-01-01T000000.01.log",
            &[chat("local", "Old", "one")],
            1,
        );
        let controller = controller_for(&temp_dir);
        let seen = recording(&controller);
        let files = Arc::new(StdMutex::new(Vec::new()));
        let file_sink = Arc::clone(&files);
        controller.subscribe_new_file(move |name| file_sink.lock().unwrap().push(name.clone()));

        controller.start().await;

        write_journal(
            temp_dir.path(),
            "Journal.2024-01-02T000000.01.log",
            &[chat("player", "New", "two"), chat("player", "New", "three")],
            2,
        );

        let outcome = controller.trigger().await;
        assert!(outcome.rotated);
        assert_eq!(outcome.events, 2);
        assert_eq!(
            controller.latest_file_name().await.as_deref(),
            Some("Journal.2024-01-02T000000.01.log")
        );
        assert_eq!(
            controller.latest_file_path().await,
            Some(temp_dir.path().join("Journal.2024-01-02T000000.01.log"))
        );

        let messages: Vec<String> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect();
        assert_eq!(messages, vec!["one", "two", "three"]);
        assert_eq!(
            *files.lock().unwrap(),
            vec![
                "Journal.2024-01-01T000000.01.log".to_string(),
                "Journal.2024-01-02T000000.01.log".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_rotation_drains_outgoing_file_first() {
        let temp_dir = TempDir::new().unwrap();
        let old = write_journal(
            temp_dir.path(),
            "Journal.2024-01-01T000000.01.log",
            &[chat("wing", "A", "a1")],
            1,
        );
        let controller = controller_for(&temp_dir);
        let seen = recording(&controller);
        controller.start().await;

        append(&old, &(chat("wing", "A", "a2") + "\n"));
        // The append bumped the old file's mtime to now; stay ahead of it.
        write_journal(
            temp_dir.path(),
            "Journal.2024-01-01T000000.02.log",
            &[chat("wing", "B", "b1")],
            1_000_000_000,
        );

        let outcome = controller.trigger().await;
        assert!(outcome.rotated);
        assert_eq!(outcome.events, 2);

        let messages: Vec<String> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect();
        assert_eq!(messages, vec!["a1", "a2", "b1"]);
    }

    #[tokio::test]
    async fn test_check_now_delivers_appended_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_journal(temp_dir.path(), "Journal.A.log", &[], 1);
        let controller = controller_for(&temp_dir);
        let seen = recording(&controller);
        controller.start().await;

        append(&path, &(chat("friend", "Cmdr", "ping") + "\n"));
        controller.check_now();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while seen.lock().unwrap().is_empty() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "ping");
        assert_eq!(seen[0].channel, ChatChannel::Friend);
    }

    #[tokio::test]
    async fn test_stop_closes_and_ignores_triggers() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_journal(temp_dir.path(), "Journal.A.log", &[], 1);
        let controller = controller_for(&temp_dir);
        let seen = recording(&controller);
        controller.start().await;

        controller.stop().await;
        assert_eq!(controller.state().await, TailerState::Stopped);
        assert!(controller.latest_file_name().await.is_none());

        append(&path, &(chat("local", "X", "late") + "\n"));
        assert_eq!(controller.trigger().await, TriggerOutcome::default());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_triggers_deliver_each_event_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_journal(temp_dir.path(), "Journal.A.log", &[], 1);
        let controller = controller_for(&temp_dir);
        let seen = recording(&controller);
        controller.start().await;

        let text: String = (0..50)
            .map(|i| chat("local", "Cmdr", &i.to_string()) + "\n")
            .collect();
        append(&path, &text);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = controller.clone();
                tokio::spawn(async move { c.trigger().await.events })
            })
            .collect();
        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert_eq!(total, 50);
        let messages: Vec<String> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect();
        let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        assert_eq!(messages, expected);
    }

    #[tokio::test]
    async fn test_unsubscribed_callback_receives_nothing() {
        let temp_dir = TempDir::new().unwrap();
        write_journal(
            temp_dir.path(),
            "Journal.A.log",
            &[chat("local", "A", "hi")],
            1,
        );
        let controller = controller_for(&temp_dir);
        let seen = Arc::new(StdMutex::new(0usize));
        let sink = Arc::clone(&seen);
        let id = controller.subscribe_chat(move |_| *sink.lock().unwrap() += 1);
        assert!(controller.unsubscribe_chat(id));

        assert_eq!(controller.start().await.events, 1);
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_for_directory_expands_env_vars() {
        std::env::set_var("JOURNAL_TRANSLATOR_CTRL_DIR", "/tmp/ed-journal");
        let controller = TailerController::for_directory("$JOURNAL_TRANSLATOR_CTRL_DIR/logs", false);
        assert_eq!(controller.directory(), Path::new("/tmp/ed-journal/logs"));
        std::env::remove_var("JOURNAL_TRANSLATOR_CTRL_DIR");
    }
}
