//! Stylesheet import discovery and dependency graph resolution.
//!
//! Given an entry point, this crate finds every stylesheet that can affect
//! its compiled output: the entry itself plus everything reachable through
//! `@import`, `@use` and `@forward` directives.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   read    ┌──────────────────┐  targets  ┌────────────────┐
//! │ Entry point  │ ────────► │ extract_imports  │ ────────► │ resolve_import │
//! └──────────────┘           │ (comment-aware)  │           │ (load paths)   │
//!        ▲                   └──────────────────┘           └───────┬────────┘
//!        │                                                          │
//!        └──────────────── queue newly found files ◄────────────────┘
//!                                                                   │
//!                                                                   ▼
//!                                                           ┌──────────────┐
//!                                                           │ ImportGraph  │
//!                                                           └──────────────┘
//! ```
//!
//! # Crate Dependencies
//!
//! ```text
//! sw-cli ──► sw-watcher ──► sw-graph ──► sw-core
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use sw_graph::{DependencyResolver, ResolveOptions, SassGraphResolver};
//! use camino::Utf8Path;
//!
//! let options = ResolveOptions::default();
//! let graph = SassGraphResolver.resolve(Utf8Path::new("/project/main.scss"), &options)?;
//! println!("{} files affect main.scss", graph.len());
//! # Ok::<(), sw_graph::ResolveError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod graph;
pub mod import;
pub mod resolver;

pub use error::ResolveError;
pub use graph::{GraphNode, ImportGraph};
pub use import::{ImportKind, ImportStatement, Syntax, extract_imports, strip_comments};
pub use resolver::{DependencyResolver, ResolveOptions, SassGraphResolver, resolve_import};
