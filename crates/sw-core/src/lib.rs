//! Core types, errors, and configuration for the stylewatch workspace.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`ConfigError`] for configuration loading and validation failures
//! - Configuration structures ([`Config`], [`WatchOptions`], [`WatchConfig`])
//! - Domain types ([`WatchSet`], [`WatchSetDiff`], [`RelevantExtensions`], [`Verbosity`])
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)
//! - Lexical path normalization shared by the resolver and the watcher

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod paths;
pub mod types;

pub use config::{Config, WatchConfig, WatchOptions};
pub use error::ConfigError;
pub use hash::{FxHashMap, FxHashSet, fx_hash_map, fx_hash_set};
pub use paths::{current_dir, normalize_path};
pub use types::{RelevantExtensions, Verbosity, WatchSet, WatchSetDiff};
