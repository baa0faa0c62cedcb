//! Incremental watch-set maintenance for stylesheet entry points.
//!
//! This crate keeps a set of watched files in step with the import graph of
//! one or more entry points and tells subscribers when something that affects
//! the compiled output changed.
//!
//! # Overview
//!
//! Two observers feed a single coordinator:
//!
//! - A **scope observer** watches the whole scope root, recursively, for
//!   relevant files and directories being added or removed. A new partial
//!   may satisfy an import that was unresolved until now, so every such
//!   event triggers a graph recomputation.
//! - A **watch-set observer** watches exactly the files of the current
//!   watch-set for content changes, debounced.
//!
//! The coordinator recomputes the watch-set after every event, applies the
//! difference to the watch-set observer and only then swaps in the new set, so
//! the watched files always equal the last computed graph.
//!
//! # Architecture
//!
//! ```text
//!  scope root (recursive)                 watch-set files (debounced)
//! ┌────────────────────┐                 ┌────────────────────┐
//! │   ScopeObserver    │                 │  WatchSetObserver  │◄──────────┐
//! │ add/unlink (dirs)  │                 │      change        │           │
//! └─────────┬──────────┘                 └─────────┬──────────┘           │
//!           │                                      │                      │
//!           ▼                                      ▼                      │
//! ┌─────────────────────────────────────────────────────────────┐         │
//! │                    WatchSetCoordinator                      │         │
//! │  currently_included_files() ─► diff ─► add/unwatch ─► swap  │─────────┘
//! └─────────────────────────────┬───────────────────────────────┘  add / unwatch
//!                               │
//!                               ▼
//!                       NotificationBus ──► init / update / error
//! ```
//!
//! # Crate Dependencies
//!
//! ```text
//! sw-cli ──► sw-watcher ──► sw-graph ──► sw-core
//!                      └───────────────────►
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use sw_watcher::{Notification, StyleWatcher};
//! use sw_core::{WatchConfig, WatchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = WatchOptions::default().with_search_path("vendor/styles");
//!     let mut watcher = StyleWatcher::new(["src/main.scss"], options)?;
//!     let mut notifications = watcher.subscribe();
//!
//!     watcher.start(&WatchConfig::default()).await?;
//!
//!     while let Some(notification) = notifications.recv().await {
//!         match notification {
//!             Notification::Init | Notification::Update => println!("rebuild"),
//!             Notification::Error(message) => eprintln!("warning: {message}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Resolution failures while running are recoverable: they are published as
//! [`Notification::Error`] and the previous watch-set stays in place.
//!
//! ```
//! use sw_watcher::WatchError;
//!
//! fn handle(err: WatchError) {
//!     if err.is_fatal() {
//!         eprintln!("fatal: {err}");
//!     } else {
//!         eprintln!("warning: {err}");
//!     }
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod bus;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod filter;
pub mod scope;
pub mod service;
pub mod subscription;

pub use bus::NotificationBus;
pub use coordinator::WatchSetCoordinator;
pub use error::WatchError;
pub use events::{FsEvent, FsEventKind, Notification, classify};
pub use filter::{FileFilter, RelevantPathFilter};
pub use scope::ScopeObserver;
pub use service::StyleWatcher;
pub use subscription::{Subscription, WatchSetObserver};
