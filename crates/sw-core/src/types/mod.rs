//! Domain types for stylewatch.
//!
//! # Module Organization
//!
//! - [`extensions`] - The set of file extensions that matter to the watcher
//! - [`verbosity`] - Diagnostic verbosity levels
//! - [`watch_set`] - The watch-set and the diff produced by recomputing it
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use sw_core::{RelevantExtensions, Verbosity, WatchSet, WatchSetDiff};
//! ```

mod extensions;
mod verbosity;
mod watch_set;

pub use extensions::RelevantExtensions;
pub use verbosity::Verbosity;
pub use watch_set::{WatchSet, WatchSetDiff};
