//! The watch-set coordinator.
//!
//! [`WatchSetCoordinator`] owns the watch-set and the fine subscription, and
//! is the only place either is mutated. Both observers funnel their events
//! into [`WatchSetCoordinator::recompute_watch_set`]:
//!
//! ```text
//!  scope event ──┐                        ┌──► subscription.add(added)
//!                ├──► recompute_watch_set ┼──► subscription.unwatch(removed)
//! change event ──┘     (resolve, diff,    └──► WatchSetDiff ──► Update?
//!                       swap)
//! ```
//!
//! The candidate watch-set is fully resolved before the old one is replaced,
//! so a resolution failure leaves the watch-set and the subscription exactly
//! as they were.

use camino::{Utf8Path, Utf8PathBuf};
use sw_core::{RelevantExtensions, Verbosity, WatchOptions, WatchSet, WatchSetDiff};
use sw_graph::{DependencyResolver, ResolveError, ResolveOptions};

use crate::error::WatchError;
use crate::events::FsEvent;
use crate::subscription::Subscription;

/// Keeps the watch-set equal to the files reachable from the entry points.
///
/// # Examples
///
/// ```no_run
/// use sw_watcher::{Subscription, WatchError, WatchSetCoordinator};
/// use sw_graph::SassGraphResolver;
/// use sw_core::WatchOptions;
/// use camino::Utf8PathBuf;
///
/// struct Printer;
///
/// impl Subscription for Printer {
///     fn add(&mut self, paths: &[Utf8PathBuf]) -> Result<(), WatchError> {
///         println!("+ {paths:?}");
///         Ok(())
///     }
///     fn unwatch(&mut self, paths: &[Utf8PathBuf]) -> Result<(), WatchError> {
///         println!("- {paths:?}");
///         Ok(())
///     }
/// }
///
/// # fn main() -> Result<(), WatchError> {
/// let options = WatchOptions::default().normalized()?;
/// let mut coordinator = WatchSetCoordinator::new(
///     vec![Utf8PathBuf::from("/project/main.scss")],
///     &options,
///     SassGraphResolver,
/// );
/// coordinator.populate(|_initial| Ok(Printer))?;
/// let diff = coordinator.recompute_watch_set()?;
/// assert!(diff.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct WatchSetCoordinator<R, S> {
    entry_points: Vec<Utf8PathBuf>,
    resolve_options: ResolveOptions,
    verbosity: Verbosity,
    resolver: R,
    watch_set: WatchSet,
    subscription: Option<S>,
}

impl<R, S> std::fmt::Debug for WatchSetCoordinator<R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSetCoordinator")
            .field("entry_points", &self.entry_points)
            .field("watched", &self.watch_set.len())
            .field("subscribed", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: DependencyResolver, S: Subscription> WatchSetCoordinator<R, S> {
    /// Creates a coordinator with an empty watch-set and no subscription.
    ///
    /// `entry_points` and the paths in `options` are expected to be absolute
    /// already (see [`WatchOptions::normalized`]).
    #[must_use]
    pub fn new(entry_points: Vec<Utf8PathBuf>, options: &WatchOptions, resolver: R) -> Self {
        Self {
            entry_points,
            resolve_options: ResolveOptions::from_watch_options(options),
            verbosity: options.verbosity,
            resolver,
            watch_set: WatchSet::new(),
            subscription: None,
        }
    }

    /// Returns the entry points, in the order they were supplied.
    #[inline]
    #[must_use]
    pub fn entry_points(&self) -> &[Utf8PathBuf] {
        &self.entry_points
    }

    /// Returns the current watch-set.
    #[inline]
    #[must_use]
    pub const fn included_files(&self) -> &WatchSet {
        &self.watch_set
    }

    /// Returns the fine subscription, once populated.
    #[inline]
    #[must_use]
    pub const fn subscription(&self) -> Option<&S> {
        self.subscription.as_ref()
    }

    /// Removes the fine subscription, leaving the watch-set as it is.
    ///
    /// Dropping the returned subscription releases its watches.
    pub fn take_subscription(&mut self) -> Option<S> {
        self.subscription.take()
    }

    /// Resolves every entry point and returns the union of their graphs.
    ///
    /// Pure: the watch-set is not touched. Entry points are always part of
    /// the result; other files are kept only if their extension is relevant.
    ///
    /// # Errors
    ///
    /// Returns the first [`ResolveError`] raised by the resolver.
    pub fn currently_included_files(&self) -> Result<WatchSet, ResolveError> {
        let extensions: &RelevantExtensions = &self.resolve_options.extensions;
        let mut files = WatchSet::new();

        for entry in &self.entry_points {
            let graph = self.resolver.resolve(entry, &self.resolve_options)?;
            files.extend(
                graph
                    .into_paths()
                    .filter(|path| path == entry || extensions.matches(path)),
            );
        }

        Ok(files)
    }

    /// Computes the initial watch-set and starts the fine subscription on it.
    ///
    /// `start` receives the initial watch-set and returns the subscription
    /// already watching it.
    ///
    /// # Errors
    ///
    /// Returns a resolution error, or whatever `start` fails with. The
    /// coordinator is left unpopulated in either case.
    pub fn populate<F>(&mut self, start: F) -> Result<&WatchSet, WatchError>
    where
        F: FnOnce(&WatchSet) -> Result<S, WatchError>,
    {
        let initial = self.currently_included_files()?;
        let subscription = start(&initial)?;

        self.watch_set = initial;
        self.subscription = Some(subscription);

        if self.verbosity.describes_events() {
            tracing::info!("Initially watched files: {}", join(self.watch_set.sorted()));
        }

        Ok(&self.watch_set)
    }

    /// Re-resolves the graph, replaces the watch-set and syncs the subscription.
    ///
    /// This is the only operation that mutates the watch-set after
    /// [`populate`](Self::populate). The returned diff satisfies
    /// `new = (old − removed) ∪ added` with `added ∩ removed = ∅`.
    ///
    /// # Errors
    ///
    /// On a resolution or subscription error the watch-set keeps its previous
    /// value. The subscription operations are idempotent, so the next
    /// recomputation re-applies whatever part of the diff did not stick.
    pub fn recompute_watch_set(&mut self) -> Result<WatchSetDiff, WatchError> {
        let candidate = self.currently_included_files()?;
        let diff = self.watch_set.diff(&candidate);

        if let Some(subscription) = self.subscription.as_mut() {
            if !diff.added.is_empty() {
                subscription.add(&diff.added)?;
            }
            if !diff.removed.is_empty() {
                subscription.unwatch(&diff.removed)?;
            }
        }

        self.watch_set = candidate;

        if self.verbosity.dumps_watch_set() {
            if !diff.added.is_empty() {
                tracing::info!("Start watching files: {}", join(diff.added.iter().map(Utf8PathBuf::as_path)));
            }
            if !diff.removed.is_empty() {
                tracing::info!("Stop watching files: {}", join(diff.removed.iter().map(Utf8PathBuf::as_path)));
            }
            if !diff.is_empty() {
                tracing::info!("Currently watched files: {}", join(self.watch_set.sorted()));
            }
        }

        Ok(diff)
    }

    /// Handles a structural event from the scope observer.
    ///
    /// Returns `true` if an `Update` should be emitted, i.e. the watch-set changed.
    pub fn handle_scope_event(&mut self, event: &FsEvent) -> Result<bool, WatchError> {
        let diff = self.recompute_watch_set()?;
        let changed = !diff.is_empty();

        if changed && self.verbosity.describes_events() {
            tracing::info!("{}", event.describe());
        }

        Ok(changed)
    }

    /// Handles a content change from the watch-set observer.
    ///
    /// Always returns `true`: a modified watched file matters even when its
    /// imports did not change.
    pub fn handle_content_change(&mut self, event: &FsEvent) -> Result<bool, WatchError> {
        self.recompute_watch_set()?;

        if self.verbosity.describes_events() {
            tracing::info!("{}", event.describe());
        }

        Ok(true)
    }
}

fn join<'a>(paths: impl IntoIterator<Item = &'a Utf8Path>) -> String {
    paths
        .into_iter()
        .map(Utf8Path::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
