//! Stimuli that drive the tailer.
//!
//! Two independent sources call [`TailerController::trigger`]: a debounced
//! filesystem notifier on the journal directory and a fixed-interval poll
//! timer. The timer keeps things moving when the notifier is missing (the
//! directory did not exist at startup) or drops events.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, EventKind, RecursiveMode},
    DebounceEventResult,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::controller::TailerController;
use super::discovery::DirectoryScanner;
use super::error::WatcherError;

/// Default poll timer period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest accepted poll period; `interval_at` panics on zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Debounce window for filesystem events.
const DEBOUNCE_TIMEOUT: Duration = Duration::from_millis(100);

/// Running trigger tasks for one controller.
///
/// Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct TriggerSources {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    notifier: bool,
}

impl TriggerSources {
    /// Spawn the notifier (when it can be set up) and the poll timer.
    ///
    /// `poll_interval` is raised to at least one millisecond.
    #[must_use]
    pub fn spawn(controller: &TailerController, poll_interval: Duration) -> Self {
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(2);

        let notifier = match spawn_notifier(controller.clone(), cancel.clone()) {
            Ok(task) => {
                tasks.push(task);
                true
            }
            Err(e) => {
                tracing::warn!(
                    dir = %controller.directory().display(),
                    error = %e,
                    "File watcher unavailable, falling back to polling"
                );
                false
            }
        };

        tasks.push(spawn_poll_timer(
            controller.clone(),
            poll_interval,
            cancel.clone(),
        ));

        Self {
            cancel,
            tasks,
            notifier,
        }
    }

    /// Whether the filesystem notifier is running.
    #[must_use]
    pub fn has_notifier(&self) -> bool {
        self.notifier
    }

    /// Stop firing new triggers without waiting for the tasks.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel both sources and wait for them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Trigger task ended abnormally");
            }
        }
    }
}

/// Whether a filesystem event may mean new journal content or a new file.
#[must_use]
pub fn is_relevant(scanner: &DirectoryScanner, event: &notify::Event) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any | EventKind::Other
    );
    kind_matches
        && (event.need_rescan()
            || event.paths.is_empty()
            || event.paths.iter().any(|p| scanner.is_journal_path(p)))
}

fn spawn_notifier(
    controller: TailerController,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, WatcherError> {
    let dir: PathBuf = controller.directory().to_path_buf();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<DebounceEventResult>();

    let mut debouncer = new_debouncer(DEBOUNCE_TIMEOUT, None, move |result: DebounceEventResult| {
        let _ = event_tx.send(result);
    })?;
    debouncer.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::debug!(dir = %dir.display(), "File watcher started");

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,
                result = event_rx.recv() => {
                    let Some(result) = result else { break };
                    handle_debounce_result(&controller, &dir, result, || {
                        let _ = debouncer.unwatch(&dir);
                        debouncer.watch(&dir, RecursiveMode::NonRecursive)
                    })
                    .await;
                }
            }
        }
        drop(debouncer);
        tracing::debug!(dir = %dir.display(), "File watcher stopped");
    }))
}

/// Act on one debouncer batch.
///
/// Relevant events trigger the controller. Errors call `restart` once to
/// re-register the watch, then trigger anyway since events may have been
/// lost while the watch was down. A failed restart leaves the poll timer
/// in charge.
async fn handle_debounce_result<R>(
    controller: &TailerController,
    dir: &Path,
    result: DebounceEventResult,
    restart: R,
) where
    R: FnOnce() -> Result<(), notify::Error>,
{
    match result {
        Ok(events) => {
            if events.iter().any(|e| is_relevant(controller.scanner(), e)) {
                controller.trigger().await;
            }
        }
        Err(errors) => {
            for error in &errors {
                tracing::warn!(dir = %dir.display(), error = %error, "File watcher error");
            }
            match restart() {
                Ok(()) => tracing::info!(dir = %dir.display(), "File watcher restarted"),
                Err(e) => tracing::warn!(
                    dir = %dir.display(),
                    error = %e,
                    "File watcher restart failed, continuing on poll timer"
                ),
            }
            controller.trigger().await;
        }
    }
}

fn spawn_poll_timer(
    controller: TailerController,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // The controller already scanned on start; first tick is one period out.
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    controller.trigger().await;
                }
            }
        }
    })
}
