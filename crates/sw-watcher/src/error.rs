//! Error types for the sw-watcher crate.
//!
//! This module provides the [`WatchError`] type for errors that can occur
//! while observing the filesystem and maintaining the watch-set.

use camino::Utf8PathBuf;
use sw_core::ConfigError;
use sw_graph::ResolveError;

/// Errors that can occur during watching.
///
/// # Error Recovery Strategy
///
/// - **Notify errors** ([`WatchError::Notify`]): Fatal to the affected observer
/// - **Path not found** ([`WatchError::PathNotFound`]): Fatal - the scope root must exist
/// - **Channel closed** ([`WatchError::ChannelClosed`]): Fatal - communication broken
/// - **Non-UTF-8 path** ([`WatchError::NonUtf8Path`]): Recoverable - skip and continue
/// - **I/O errors** ([`WatchError::Io`]): Fatal - propagate immediately
/// - **Resolution errors** ([`WatchError::Resolve`]): Recoverable - the watch-set keeps
///   its last good value and the next event retries
/// - **Subscribe errors** ([`WatchError::Subscribe`]): Recoverable - the file stays
///   out of the watch-set and the next recomputation retries it
/// - **Config errors** ([`WatchError::Config`]): Fatal - options must be fixed
/// - **Already started** ([`WatchError::AlreadyStarted`]): Fatal - caller bug
///
/// # Examples
///
/// ```
/// use sw_watcher::WatchError;
///
/// fn handle_error(err: &WatchError) {
///     if err.is_recoverable() {
///         eprintln!("warning: {err}");
///     } else {
///         eprintln!("fatal: {err}");
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Failed to initialize or operate a notify watcher.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The specified path does not exist.
    ///
    /// The scope observer requires an existing directory to watch.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The event channel was closed unexpectedly.
    ///
    /// This indicates a communication failure between an observer thread
    /// and the driver loop, or a panicked observer task.
    #[error("event channel closed unexpectedly")]
    ChannelClosed,

    /// A path is not valid UTF-8.
    ///
    /// This crate uses UTF-8 paths throughout. If a non-UTF-8 path is
    /// encountered in a file event, it is logged and skipped.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The dependency graph could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The directory of a watch-set file could not be watched.
    #[error("failed to watch {path}: {source}")]
    Subscribe {
        /// The file whose directory was rejected.
        path: Utf8PathBuf,
        /// The backend error.
        #[source]
        source: notify::Error,
    },

    /// The watch options are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// [`start`](crate::StyleWatcher::start) was called on a running watcher.
    #[error("watcher already started")]
    AlreadyStarted,
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Creates a new [`WatchError::NonUtf8Path`] error.
    #[inline]
    pub fn non_utf8_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self::NonUtf8Path(path.into())
    }

    /// Returns `true` if this error is recoverable (watching can continue).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NonUtf8Path(_) | Self::Resolve(_) | Self::Subscribe { .. }
        )
    }

    /// Returns `true` if this error is fatal (watching should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) | Self::Subscribe { path, .. } => Some(path),
            Self::Resolve(err) => err.path(),
            Self::Notify(_)
            | Self::ChannelClosed
            | Self::NonUtf8Path(_)
            | Self::Io(_)
            | Self::Config(_)
            | Self::AlreadyStarted => None,
        }
    }
}
