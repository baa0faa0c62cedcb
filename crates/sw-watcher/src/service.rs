//! The watcher driver.
//!
//! [`StyleWatcher`] wires the scope observer, the watch-set observer and the
//! coordinator into a single event loop and publishes notifications.
//!
//! # Event Loop
//!
//! ```text
//!                 ┌──────────────────────────── tokio task ───────────────────────────┐
//! ScopeObserver ──┤                                                                   │
//!   (add, unlink) │  select! { shutdown | scope.recv() | changes.recv() }             │
//!                 │        │                                                          │
//! WatchSetObserver┤        ▼                                                          │
//!   (change)      │  coordinator.handle_*()  ──►  Ok(true)  ──► bus.emit(Update)      │
//!                 │                          ──►  Err(resolve) ► bus.emit(Error)      │
//!                 └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events are processed one at a time, in arrival order, each recomputation
//! running to completion before the next event is looked at.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use sw_core::{WatchConfig, WatchOptions, WatchSet, current_dir, normalize_path};
use sw_graph::{DependencyResolver, SassGraphResolver};

use crate::bus::NotificationBus;
use crate::coordinator::WatchSetCoordinator;
use crate::error::WatchError;
use crate::events::{FsEvent, Notification};
use crate::filter::RelevantPathFilter;
use crate::scope::ScopeObserver;
use crate::subscription::{Subscription, WatchSetObserver};

type SharedCoordinator<R> = Arc<Mutex<WatchSetCoordinator<R, WatchSetObserver>>>;

/// Handle to the spawned event loop.
struct Running {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), WatchError>>>,
}

/// Watches stylesheet entry points and everything they import.
///
/// # Lifecycle
///
/// 1. **Construction** normalizes every path and schedules `Init`. `Init` is
///    never delivered inline: it is held until the event loop runs and
///    someone is subscribed, so a subscriber registered after construction
///    always receives it, before any `Update`.
/// 2. **`start()`** starts the scope observer, resolves the initial
///    watch-set, starts the watch-set observer on it and spawns the event loop.
/// 3. **`shutdown()`** stops the loop and both observers.
///
/// # Examples
///
/// ```no_run
/// use sw_watcher::{Notification, StyleWatcher};
/// use sw_core::{WatchConfig, WatchOptions};
///
/// # async fn example() -> Result<(), sw_watcher::WatchError> {
/// let mut watcher = StyleWatcher::new(["styles/main.scss"], WatchOptions::default())?;
/// let mut notifications = watcher.subscribe();
/// watcher.start(&WatchConfig::default()).await?;
///
/// while let Some(notification) = notifications.recv().await {
///     match notification {
///         Notification::Init | Notification::Update => {
///             println!("rebuild ({} files watched)", watcher.included_files().len());
///         }
///         Notification::Error(message) => eprintln!("{message}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct StyleWatcher<R: DependencyResolver = SassGraphResolver> {
    options: WatchOptions,
    coordinator: SharedCoordinator<R>,
    bus: NotificationBus,
    running: Option<Running>,
}

impl<R: DependencyResolver> std::fmt::Debug for StyleWatcher<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleWatcher")
            .field("options", &self.options)
            .field("coordinator", &*self.coordinator.lock())
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl StyleWatcher<SassGraphResolver> {
    /// Creates a watcher using the filesystem-backed Sass resolver.
    ///
    /// Relative paths are resolved against the process working directory.
    pub fn new<I, P>(entry_points: I, options: WatchOptions) -> Result<Self, WatchError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        Self::with_resolver(entry_points, options, SassGraphResolver)
    }
}

impl<R: DependencyResolver> StyleWatcher<R> {
    /// Creates a watcher with a custom dependency resolver.
    pub fn with_resolver<I, P>(
        entry_points: I,
        options: WatchOptions,
        resolver: R,
    ) -> Result<Self, WatchError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let cwd = current_dir()?;
        Ok(Self::with_resolver_in(&cwd, entry_points, options, resolver))
    }

    /// Creates a watcher resolving relative paths against `cwd`.
    pub fn with_resolver_in<I, P>(
        cwd: &Utf8Path,
        entry_points: I,
        options: WatchOptions,
        resolver: R,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let options = options.normalized_against(cwd);
        let entry_points: Vec<Utf8PathBuf> = entry_points
            .into_iter()
            .map(|path| normalize_path(cwd, path.as_ref()))
            .collect();

        if options.verbosity.announces_startup() {
            let names: Vec<&str> = entry_points.iter().map(|path| path.as_str()).collect();
            tracing::info!("Start watching \"{}\"...", names.join(", "));
        }

        let coordinator = WatchSetCoordinator::new(entry_points, &options, resolver);
        let bus = NotificationBus::new();
        bus.schedule(Notification::Init);

        Self {
            options,
            coordinator: Arc::new(Mutex::new(coordinator)),
            bus,
            running: None,
        }
    }

    /// Registers a notification subscriber.
    ///
    /// `Init` stays scheduled until the event loop runs with at least one
    /// subscriber, so subscribing any time before [`start`](Self::start)
    /// guarantees it is received first.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        let rx = self.bus.subscribe();
        if self.running.is_some() {
            self.bus.flush_pending();
        }
        rx
    }

    /// Returns the normalized options.
    #[must_use]
    pub const fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Returns the normalized entry points.
    #[must_use]
    pub fn entry_points(&self) -> Vec<Utf8PathBuf> {
        self.coordinator.lock().entry_points().to_vec()
    }

    /// Returns a snapshot of the current watch-set.
    #[must_use]
    pub fn included_files(&self) -> WatchSet {
        self.coordinator.lock().included_files().clone()
    }

    /// Returns `true` while the event loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .and_then(|running| running.task.as_ref())
            .is_some_and(|task| !task.is_finished())
    }

    /// Starts both observers and the event loop.
    ///
    /// The scope observer starts first, then the initial watch-set is
    /// resolved and the watch-set observer starts on it.
    ///
    /// # Errors
    ///
    /// - [`WatchError::AlreadyStarted`] if called twice
    /// - [`WatchError::Config`] if the options are invalid
    /// - [`WatchError::PathNotFound`] if the scope root doesn't exist
    /// - [`WatchError::Resolve`] if the initial watch-set cannot be resolved
    pub async fn start(&mut self, config: &WatchConfig) -> Result<(), WatchError> {
        if self.running.is_some() {
            return Err(WatchError::AlreadyStarted);
        }
        self.options.validate()?;

        let filter = RelevantPathFilter::new(self.options.extensions.clone());
        let scope = ScopeObserver::new(self.options.scope_root(), filter, config).await?;

        let changes = populate(&self.coordinator, config)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_event_loop(
            Arc::clone(&self.coordinator),
            self.bus.clone(),
            scope,
            changes,
            shutdown_rx,
        ));

        self.running = Some(Running {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        });

        Ok(())
    }

    /// Stops the event loop and both observers.
    ///
    /// Calling this on a watcher that never started is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the loop, if any, or
    /// [`WatchError::ChannelClosed`] if the loop task panicked.
    pub async fn shutdown(&mut self) -> Result<(), WatchError> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };

        if let Some(tx) = running.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = running.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(_join_error) => return Err(WatchError::ChannelClosed),
            }
        }

        Ok(())
    }
}

impl<R: DependencyResolver> Drop for StyleWatcher<R> {
    fn drop(&mut self) {
        if let Some(tx) = self
            .running
            .as_mut()
            .and_then(|running| running.shutdown_tx.take())
        {
            let _ = tx.send(());
        }
    }
}

/// Resolves the initial watch-set and starts the watch-set observer on it.
fn populate<R: DependencyResolver>(
    coordinator: &SharedCoordinator<R>,
    config: &WatchConfig,
) -> Result<mpsc::Receiver<FsEvent>, WatchError> {
    let mut changes = None;
    coordinator.lock().populate(|initial| {
        let paths: Vec<Utf8PathBuf> = initial.sorted().into_iter().map(ToOwned::to_owned).collect();
        let (observer, rx) = WatchSetObserver::new(&paths, config)?;
        changes = Some(rx);
        Ok(observer)
    })?;
    changes.ok_or(WatchError::ChannelClosed)
}

/// Which observer an event came from.
#[derive(Clone, Copy)]
enum Source {
    Scope,
    Content,
}

/// Runs one event through the coordinator.
fn process<R: DependencyResolver, S: Subscription>(
    coordinator: &Mutex<WatchSetCoordinator<R, S>>,
    source: Source,
    event: &FsEvent,
) -> Result<bool, WatchError> {
    let mut coordinator = coordinator.lock();
    match source {
        Source::Scope => coordinator.handle_scope_event(event),
        Source::Content => coordinator.handle_content_change(event),
    }
}

async fn run_event_loop<R: DependencyResolver>(
    coordinator: SharedCoordinator<R>,
    bus: NotificationBus,
    mut scope: ScopeObserver,
    mut changes: mpsc::Receiver<FsEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), WatchError> {
    let outcome = drive(
        &coordinator,
        &bus,
        scope.events_mut(),
        &mut changes,
        &mut shutdown_rx,
    )
    .await;

    drop(coordinator.lock().take_subscription());
    scope.shutdown().await?;
    outcome
}

/// Processes events until the shutdown signal or a fatal error.
async fn drive<R: DependencyResolver, S: Subscription>(
    coordinator: &Mutex<WatchSetCoordinator<R, S>>,
    bus: &NotificationBus,
    scope: &mut mpsc::Receiver<FsEvent>,
    changes: &mut mpsc::Receiver<FsEvent>,
    shutdown_rx: &mut oneshot::Receiver<()>,
) -> Result<(), WatchError> {
    bus.flush_pending();
    tracing::debug!("Watch loop started");

    let mut outcome = Ok(());
    loop {
        let (source, event) = tokio::select! {
            biased;
            _ = &mut *shutdown_rx => break,
            Some(event) = scope.recv() => (Source::Scope, event),
            Some(event) = changes.recv() => (Source::Content, event),
            else => break,
        };

        tracing::trace!(path = %event.path, kind = %event.kind, "Processing event");

        match process(coordinator, source, &event) {
            Ok(true) => bus.emit(Notification::Update),
            Ok(false) => {}
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, path = %event.path, "Failed to recompute watch-set");
                bus.emit(Notification::Error(err.to_string()));
            }
            Err(err) => {
                tracing::error!(error = %err, "Fatal watcher error");
                bus.emit(Notification::Error(err.to_string()));
                outcome = Err(err);
                break;
            }
        }
    }

    tracing::debug!("Watch loop stopped");
    outcome
}
