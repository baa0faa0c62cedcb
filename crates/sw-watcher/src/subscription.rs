//! The fine watch-set observer and the subscription seam it implements.
//!
//! [`WatchSetObserver`] watches exactly the files of the watch-set for content
//! changes. `notify` backends watch directories far more reliably than single
//! files (editors that save by writing a temporary file and renaming it over
//! the replaced file would otherwise lose its watch), so the observer watches the
//! parent directory of every file, reference-counted, and forwards only
//! events whose path is in the watched set.
//!
//! ```text
//! add([_a.scss, _b.scss])            unwatch([_a.scss])
//!        │                                  │
//!        ▼                                  ▼
//!  watched: {_a, _b}                  watched: {_b}
//!  dirs:    {styles/: 2} ── watch ──► dirs:    {styles/: 1}   (still watched)
//! ```

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use sw_core::{FxHashMap, FxHashSet, WatchConfig, fx_hash_map, fx_hash_set};

use crate::error::WatchError;
use crate::events::{FsEvent, FsEventKind, to_utf8};

/// Default channel capacity for content-change events.
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// A mutable set of watched paths.
///
/// The coordinator applies every watch-set diff through this trait, so the
/// subscription and the watch-set stay in step by construction.
pub trait Subscription: Send + 'static {
    /// Starts watching `paths`. Already-watched paths are ignored.
    ///
    /// A path that fails to be watched is left unwatched, so adding it again
    /// retries it.
    fn add(&mut self, paths: &[Utf8PathBuf]) -> Result<(), WatchError>;

    /// Stops watching `paths`. Unknown paths are ignored.
    fn unwatch(&mut self, paths: &[Utf8PathBuf]) -> Result<(), WatchError>;
}

/// Watches a set of files for content changes, with debouncing.
///
/// # Examples
///
/// ```no_run
/// use sw_watcher::{Subscription, WatchSetObserver};
/// use sw_core::WatchConfig;
/// use camino::Utf8PathBuf;
///
/// # async fn example() -> Result<(), sw_watcher::WatchError> {
/// let files = [Utf8PathBuf::from("/project/main.scss")];
/// let (mut observer, mut changes) = WatchSetObserver::new(&files, &WatchConfig::default())?;
///
/// observer.add(&[Utf8PathBuf::from("/project/_vars.scss")])?;
/// while let Some(event) = changes.recv().await {
///     println!("{}", event.describe());
/// }
/// # Ok(())
/// # }
/// ```
pub struct WatchSetObserver {
    /// The debounced backend. Dropping it stops its thread.
    debouncer: Debouncer<RecommendedWatcher>,

    /// Files whose changes are forwarded; shared with the backend callback.
    watched: Arc<RwLock<FxHashSet<Utf8PathBuf>>>,

    /// Watched parent directories and how many watched files each holds.
    directories: FxHashMap<Utf8PathBuf, usize>,
}

impl std::fmt::Debug for WatchSetObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSetObserver")
            .field("files", &self.watched.read().len())
            .field("directories", &self.directories.len())
            .finish_non_exhaustive()
    }
}

impl WatchSetObserver {
    /// Starts a debounced observer on `paths`.
    ///
    /// Returns the observer together with the receiver of its `change`
    /// events, so the observer itself can be handed to the coordinator while
    /// the driver loop owns the receiver.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Notify`] if the backend fails to initialize, or
    /// [`WatchError::Subscribe`] if the directory of one of `paths` cannot be
    /// watched.
    pub fn new(
        paths: &[Utf8PathBuf],
        config: &WatchConfig,
    ) -> Result<(Self, mpsc::Receiver<FsEvent>), WatchError> {
        let (event_tx, event_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let watched: Arc<RwLock<FxHashSet<Utf8PathBuf>>> = Arc::new(RwLock::new(fx_hash_set()));

        let callback_watched = Arc::clone(&watched);
        let tx = event_tx;
        let debouncer = new_debouncer(
            Duration::from_millis(config.debounce_ms),
            move |res: DebounceEventResult| match res {
                Ok(events) => {
                    for event in events {
                        let Some(path) = to_utf8(&event.path) else {
                            continue;
                        };

                        // Removals are the scope observer's business.
                        if !callback_watched.read().contains(&path) || !path.is_file() {
                            continue;
                        }

                        if tx.blocking_send(FsEvent::new(FsEventKind::Change, path)).is_err() {
                            tracing::debug!("Change channel closed, dropping events");
                            break;
                        }
                    }
                }
                Err(error) => tracing::warn!(error = %error, "Debouncer error"),
            },
        )?;

        let mut observer = Self {
            debouncer,
            watched,
            directories: fx_hash_map(),
        };
        observer.add(paths)?;

        Ok((observer, event_rx))
    }

    /// Returns `true` if changes to `path` are forwarded.
    #[must_use]
    pub fn is_watching(&self, path: &Utf8Path) -> bool {
        self.watched.read().contains(path)
    }

    /// Returns the number of watched files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watched.read().len()
    }

    /// Returns `true` if no file is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watched.read().is_empty()
    }

    /// Returns the number of directories registered with the backend.
    #[must_use]
    pub fn watched_directories(&self) -> usize {
        self.directories.len()
    }
}

impl Subscription for WatchSetObserver {
    fn add(&mut self, paths: &[Utf8PathBuf]) -> Result<(), WatchError> {
        for path in paths {
            if !self.watched.write().insert(path.clone()) {
                continue;
            }
            let Some(dir) = path.parent() else {
                continue;
            };

            if let Some(count) = self.directories.get_mut(dir) {
                *count += 1;
                continue;
            }

            if let Err(source) = self
                .debouncer
                .watcher()
                .watch(dir.as_std_path(), RecursiveMode::NonRecursive)
            {
                self.watched.write().remove(path);
                tracing::warn!(path = %dir, error = %source, "Failed to watch directory");
                return Err(WatchError::Subscribe {
                    path: path.clone(),
                    source,
                });
            }
            tracing::trace!(path = %dir, "Watching directory");
            self.directories.insert(dir.to_owned(), 1);
        }

        Ok(())
    }

    fn unwatch(&mut self, paths: &[Utf8PathBuf]) -> Result<(), WatchError> {
        for path in paths {
            if !self.watched.write().remove(path) {
                continue;
            }
            let Some(dir) = path.parent() else {
                continue;
            };

            let Some(count) = self.directories.get_mut(dir) else {
                continue;
            };
            *count = count.saturating_sub(1);
            if *count > 0 {
                continue;
            }

            self.directories.remove(dir);
            if let Err(error) = self.debouncer.watcher().unwatch(dir.as_std_path()) {
                tracing::debug!(path = %dir, error = %error, "Failed to unwatch directory");
            } else {
                tracing::trace!(path = %dir, "Stopped watching directory");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(names: &[&str]) -> (TempDir, Vec<Utf8PathBuf>) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path").to_owned();
        let paths = names
            .iter()
            .map(|name| {
                let path = root.join(name);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).expect("create parent");
                }
                fs::write(&path, "").expect("write file");
                path
            })
            .collect();
        (dir, paths)
    }

    #[tokio::test]
    async fn test_directories_are_reference_counted() {
        let (_dir, paths) = fixture(&["a.scss", "_b.scss", "nested/_c.scss"]);
        let (mut observer, _rx) =
            WatchSetObserver::new(&paths, &WatchConfig::default()).expect("observer");

        assert_eq!(observer.len(), 3);
        assert_eq!(observer.watched_directories(), 2);

        observer.unwatch(&paths[..1]).expect("unwatch");
        assert!(!observer.is_watching(&paths[0]));
        assert_eq!(observer.watched_directories(), 2);

        observer.unwatch(&paths[1..]).expect("unwatch");
        assert!(observer.is_empty());
        assert_eq!(observer.watched_directories(), 0);
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (_dir, paths) = fixture(&["a.scss"]);
        let (mut observer, _rx) =
            WatchSetObserver::new(&[], &WatchConfig::default()).expect("observer");

        observer.add(&paths).expect("add");
        observer.add(&paths).expect("add");
        assert_eq!(observer.len(), 1);

        observer.unwatch(&paths).expect("unwatch");
        assert_eq!(observer.watched_directories(), 0);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_failed_directory_watch_is_retried() {
        let (dir, paths) = fixture(&["main.scss"]);
        let (mut observer, _rx) =
            WatchSetObserver::new(&paths, &WatchConfig::default()).expect("observer");
        let nested = Utf8Path::from_path(dir.path())
            .expect("Invalid path")
            .join("later/_a.scss");

        let result = observer.add(std::slice::from_ref(&nested));
        assert!(matches!(result, Err(WatchError::Subscribe { .. })));
        assert!(!observer.is_watching(&nested));
        assert_eq!(observer.len(), 1);
        assert_eq!(observer.watched_directories(), 1);

        fs::create_dir_all(nested.parent().expect("parent")).expect("create dir");
        observer.add(std::slice::from_ref(&nested)).expect("add");
        assert!(observer.is_watching(&nested));
        assert_eq!(observer.watched_directories(), 2);
    }

    #[tokio::test]
    async fn test_unwatch_unknown_path_is_ignored() {
        let (mut observer, _rx) =
            WatchSetObserver::new(&[], &WatchConfig::default()).expect("observer");
        observer
            .unwatch(&[Utf8PathBuf::from("/not/watched.scss")])
            .expect("unwatch");
        assert!(observer.is_empty());
    }

    #[tokio::test]
    async fn test_change_on_watched_file_is_forwarded() {
        let (_dir, paths) = fixture(&["main.scss", "other.scss"]);
        let config = WatchConfig {
            debounce_ms: 20,
            ..WatchConfig::default()
        };
        let (_observer, mut rx) = WatchSetObserver::new(&paths[..1], &config).expect("observer");

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&paths[1], ".b {}").expect("write unwatched");
        fs::write(&paths[0], ".a {}").expect("write watched");

        // Timing is platform dependent; only check what arrives
        let result = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        if let Ok(Some(event)) = result {
            assert_eq!(event.kind, FsEventKind::Change);
            assert_eq!(event.path, paths[0]);
        }
    }
}
