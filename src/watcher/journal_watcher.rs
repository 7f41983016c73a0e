//! Owning handle for a running journal tailer.

use std::time::Duration;

use crate::config::JournalConfig;

use super::controller::{TailerController, TailerState, TriggerOutcome};
use super::triggers::{TriggerSources, DEFAULT_POLL_INTERVAL};

/// Constructor parameters for a [`JournalWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailerOptions {
    /// Journal directory; environment variables are expanded.
    pub directory: String,
    pub enabled: bool,
    /// Log per-line skip reasons and per-trigger outcomes at debug level.
    pub debug_logging: bool,
    pub poll_interval: Duration,
}

impl TailerOptions {
    #[must_use]
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            enabled: true,
            debug_logging: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl From<&JournalConfig> for TailerOptions {
    fn from(config: &JournalConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            enabled: config.enabled,
            debug_logging: config.debug_logging,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }
}

/// A [`TailerController`] together with its trigger sources.
///
/// Subscribe through [`JournalWatcher::controller`] before calling
/// [`JournalWatcher::start`] to receive the initial backlog.
#[derive(Debug)]
pub struct JournalWatcher {
    options: TailerOptions,
    controller: TailerController,
    triggers: Option<TriggerSources>,
}

impl JournalWatcher {
    #[must_use]
    pub fn new(options: TailerOptions) -> Self {
        let controller = TailerController::for_directory(&options.directory, options.debug_logging);
        Self {
            options,
            controller,
            triggers: None,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &TailerController {
        &self.controller
    }

    #[must_use]
    pub fn options(&self) -> &TailerOptions {
        &self.options
    }

    /// Whether the filesystem notifier is active (polling always is).
    #[must_use]
    pub fn has_notifier(&self) -> bool {
        self.triggers.as_ref().is_some_and(TriggerSources::has_notifier)
    }

    /// Scan, emit the backlog and begin reacting to triggers.
    ///
    /// Does nothing when disabled or already running. Must be called inside
    /// a tokio runtime.
    pub async fn start(&mut self) -> TriggerOutcome {
        if !self.options.enabled {
            tracing::info!("Journal tailing disabled by configuration");
            return TriggerOutcome::default();
        }
        if self.triggers.is_some() {
            return TriggerOutcome::default();
        }

        let outcome = self.controller.start().await;
        self.triggers = Some(TriggerSources::spawn(
            &self.controller,
            self.options.poll_interval,
        ));
        outcome
    }

    /// Stop the triggers and close the active file.
    pub async fn stop(&mut self) {
        if let Some(triggers) = self.triggers.take() {
            triggers.cancel();
            self.controller.stop().await;
            triggers.shutdown().await;
        } else {
            self.controller.stop().await;
        }
    }

    pub async fn state(&self) -> TailerState {
        self.controller.state().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn options_for(dir: &TempDir) -> TailerOptions {
        TailerOptions {
            poll_interval: Duration::from_millis(20),
            ..TailerOptions::new(dir.path().to_string_lossy())
        }
    }

    #[test]
    fn test_options_from_config() {
        let config = JournalConfig {
            enabled: false,
            directory: "/tmp/journal".to_string(),
            poll_interval_ms: 250,
            debug_logging: true,
        };
        let options = TailerOptions::from(&config);
        assert!(!options.enabled);
        assert!(options.debug_logging);
        assert_eq!(options.directory, "/tmp/journal");
        assert_eq!(options.poll_interval, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_disabled_watcher_stays_stopped() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("Journal.A.log"),
            "{\"event\":\"ReceiveText\",\"From\":\"A\",\"Message\":\"x\",\"Channel\":\"local\"}\n",
        )
        .unwrap();

        let mut watcher = JournalWatcher::new(TailerOptions {
            enabled: false,
            ..options_for(&temp_dir)
        });
        let outcome = watcher.start().await;

        assert_eq!(outcome, TriggerOutcome::default());
        assert_eq!(watcher.state().await, TailerState::Stopped);
        assert!(!watcher.has_notifier());
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("Journal.A.log"),
            "{\"event\":\"ReceiveText\",\"From\":\"A\",\"Message\":\"x\",\"Channel\":\"wing\"}\n",
        )
        .unwrap();

        let mut watcher = JournalWatcher::new(options_for(&temp_dir));
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        watcher.controller().subscribe_chat(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = watcher.start().await;
        assert!(outcome.rotated);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.state().await, TailerState::Tailing);

        // Second start is a no-op.
        assert_eq!(watcher.start().await, TriggerOutcome::default());

        watcher.stop().await;
        assert_eq!(watcher.state().await, TailerState::Stopped);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
