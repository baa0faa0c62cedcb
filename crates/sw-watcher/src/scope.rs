//! The coarse scope observer.
//!
//! This module provides [`ScopeObserver`], which watches the whole scope root
//! for structural changes (files and directories appearing or disappearing)
//! and bridges them from the synchronous `notify` backend to the async
//! driver loop.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Blocking Thread (spawn_blocking)             │
//! │  ┌──────────────────┐    ┌────────────────┐    ┌────────────┐   │
//! │  │ RecommendedWatcher│ -> │ classify()     │ -> │ FileFilter │   │
//! │  │ (notify, raw)    │    │ (event kinds)  │    │ (extension)│   │
//! │  └──────────────────┘    └────────────────┘    └─────┬──────┘   │
//! └──────────────────────────────────────────────────────│──────────┘
//!                                                        │
//!                                          blocking_send │
//!                                                        ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Async Runtime (tokio)                        │
//! │  ┌──────────────────┐    ┌────────────────┐                     │
//! │  │ ScopeObserver    │    │ mpsc::Receiver │ -> Driver Loop      │
//! │  │ (shutdown ctrl)  │    │ (FsEvent)      │                     │
//! │  └──────────────────┘    └────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike the watch-set observer, structural events are not debounced: the
//! kind of each event (`add` vs `unlink`) matters and a debouncer would
//! collapse it away.

use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use sw_core::WatchConfig;

use crate::error::WatchError;
use crate::events::{FsEvent, classify};
use crate::filter::FileFilter;

/// Default channel capacity for structural events.
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Watches a directory tree for relevant files and directories being added or removed.
///
/// # Lifecycle
///
/// 1. **Creation**: `ScopeObserver::new()` validates the root, creates the
///    channels, and spawns a blocking task owning the `notify` watcher.
/// 2. **Event Reception**: `recv()` yields events that already passed the filter.
/// 3. **Shutdown**: call `shutdown()`, or drop the observer. Dropping sends
///    the shutdown signal without waiting for the task.
///
/// # Examples
///
/// ```no_run
/// use sw_watcher::{RelevantPathFilter, ScopeObserver};
/// use sw_core::WatchConfig;
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), sw_watcher::WatchError> {
/// let mut observer = ScopeObserver::new(
///     Utf8Path::new("./styles"),
///     RelevantPathFilter::default(),
///     &WatchConfig::default(),
/// ).await?;
///
/// while let Some(event) = observer.recv().await {
///     println!("{}", event.describe());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ScopeObserver {
    /// Shutdown signal sender. `None` once shutdown was initiated.
    shutdown_tx: Option<oneshot::Sender<()>>,

    /// Handle to the blocking watcher task.
    task_handle: Option<JoinHandle<Result<(), WatchError>>>,

    /// Event receiver for async consumption.
    event_rx: mpsc::Receiver<FsEvent>,

    /// The canonical scope root.
    root: Utf8PathBuf,
}

impl std::fmt::Debug for ScopeObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeObserver")
            .field("root", &self.root)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl ScopeObserver {
    /// Starts observing `root`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if the root doesn't exist, or
    /// [`WatchError::Io`] if it cannot be canonicalized. Failures of the
    /// `notify` backend itself are reported by [`ScopeObserver::shutdown`].
    #[allow(clippy::unused_async)] // Async for API consistency with shutdown()
    pub async fn new<F: FileFilter>(
        root: &Utf8Path,
        filter: F,
        config: &WatchConfig,
    ) -> Result<Self, WatchError> {
        if !root.exists() {
            return Err(WatchError::path_not_found(root));
        }

        let root = root.canonicalize_utf8().map_err(WatchError::Io)?;

        let (event_tx, event_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task_root = root.clone();
        let recursive = config.recursive;

        let task_handle = tokio::task::spawn_blocking(move || {
            run_scope_loop(task_root, recursive, event_tx, shutdown_rx, filter)
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            event_rx,
            root,
        })
    }

    /// Receives the next structural event.
    ///
    /// Returns `None` once the observer has shut down.
    pub async fn recv(&mut self) -> Option<FsEvent> {
        self.event_rx.recv().await
    }

    /// The receiving end of the event channel, for the driver loop.
    pub(crate) fn events_mut(&mut self) -> &mut mpsc::Receiver<FsEvent> {
        &mut self.event_rx
    }

    /// Returns the canonical scope root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns `true` if the backend task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the backend and waits for its task to finish.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if it failed to start, or
    /// [`WatchError::ChannelClosed`] if its task panicked.
    pub async fn shutdown(mut self) -> Result<(), WatchError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(_join_error) => return Err(WatchError::ChannelClosed),
            }
        }

        Ok(())
    }
}

impl Drop for ScopeObserver {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Runs the `notify` watcher in a blocking context until shutdown.
#[allow(clippy::needless_pass_by_value)] // Owned values live for the whole blocking task
fn run_scope_loop<F: FileFilter>(
    root: Utf8PathBuf,
    recursive: bool,
    event_tx: mpsc::Sender<FsEvent>,
    shutdown_rx: oneshot::Receiver<()>,
    filter: F,
) -> Result<(), WatchError> {
    let tx = event_tx;
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                for fs_event in classify(&event) {
                    if !filter.should_process(&fs_event) {
                        tracing::trace!(path = %fs_event.path, kind = %fs_event.kind, "Filtered out scope event");
                        continue;
                    }

                    if tx.blocking_send(fs_event).is_err() {
                        tracing::debug!("Scope channel closed, dropping events");
                        break;
                    }
                }
            }
            Err(error) => tracing::warn!(error = %error, "Scope watcher error"),
        }
    })?;

    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };

    watcher.watch(root.as_std_path(), mode)?;

    tracing::info!(path = %root, recursive = recursive, "Scope observer started");

    let _ = shutdown_rx.blocking_recv();

    tracing::info!(path = %root, "Scope observer stopped");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FsEventKind;
    use crate::filter::RelevantPathFilter;
    use std::fs;
    use std::time::Duration;
    use sw_core::RelevantExtensions;
    use tempfile::TempDir;

    fn create_temp_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp directory")
    }

    #[tokio::test]
    async fn test_observer_creation() {
        let temp_dir = create_temp_dir();
        let path = Utf8Path::from_path(temp_dir.path()).expect("Invalid path");

        let observer = ScopeObserver::new(path, RelevantPathFilter::default(), &WatchConfig::default())
            .await
            .expect("Observer should be created");
        assert!(observer.is_running());
        assert!(observer.root().is_absolute());
    }

    #[tokio::test]
    async fn test_observer_root_not_found() {
        let path = Utf8Path::new("/nonexistent/path/that/does/not/exist");
        let result =
            ScopeObserver::new(path, RelevantPathFilter::default(), &WatchConfig::default()).await;

        match result {
            Err(WatchError::PathNotFound(_)) => {}
            other => panic!("Expected PathNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_observer_shutdown() {
        let temp_dir = create_temp_dir();
        let path = Utf8Path::from_path(temp_dir.path()).expect("Invalid path");

        let observer = ScopeObserver::new(path, RelevantPathFilter::default(), &WatchConfig::default())
            .await
            .expect("Failed to create observer");

        assert!(observer.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn test_observer_reports_new_stylesheet() {
        let temp_dir = create_temp_dir();
        let path = Utf8Path::from_path(temp_dir.path()).expect("Invalid path");

        let mut observer =
            ScopeObserver::new(path, RelevantPathFilter::default(), &WatchConfig::default())
                .await
                .expect("Failed to create observer");

        // Give the backend time to register its watch
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(temp_dir.path().join("_new.scss"), "$a: 1;").expect("Failed to write file");

        // Event delivery timing is platform dependent, so only check what arrives
        let result = tokio::time::timeout(Duration::from_secs(2), observer.recv()).await;
        if let Ok(Some(event)) = result {
            assert_eq!(event.kind, FsEventKind::Add);
            assert_eq!(event.path.file_name(), Some("_new.scss"));
        }
    }

    #[tokio::test]
    async fn test_observer_ignores_irrelevant_extension() {
        let temp_dir = create_temp_dir();
        let path = Utf8Path::from_path(temp_dir.path()).expect("Invalid path");

        let filter = RelevantPathFilter::new(RelevantExtensions::new(["css"]));
        let mut observer = ScopeObserver::new(path, filter, &WatchConfig::default())
            .await
            .expect("Failed to create observer");

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(temp_dir.path().join("_new.scss"), "$a: 1;").expect("Failed to write file");

        let result = tokio::time::timeout(Duration::from_millis(500), observer.recv()).await;
        assert!(result.is_err(), "no event expected, got {result:?}");
    }
}
