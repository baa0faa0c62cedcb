//! Error types for the sw-graph crate.
//!
//! This module provides the [`ResolveError`] type for errors that can occur
//! while discovering the files an entry point depends on.

use camino::Utf8PathBuf;

/// Errors that can occur while resolving the dependency graph of an entry point.
///
/// # Error Recovery Strategy
///
/// A resolution error never touches the watch-set: the coordinator keeps the
/// last good watch-set and reports the error to subscribers. Watching goes on
/// and the next filesystem event triggers a fresh attempt.
///
/// # Examples
///
/// ```
/// use sw_graph::ResolveError;
///
/// fn describe(err: &ResolveError) -> String {
///     match err {
///         ResolveError::EntryNotFound(path) => format!("missing entry {path}"),
///         ResolveError::UnresolvedImport { import, .. } => format!("unknown import {import}"),
///         other => other.to_string(),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// An entry point does not exist or is not a regular file.
    #[error("entry point not found: {0}")]
    EntryNotFound(Utf8PathBuf),

    /// A stylesheet in the graph could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An import could not be located in any load path.
    ///
    /// Only produced when strict import resolution is enabled.
    #[error("cannot resolve import '{import}' from {importer}")]
    UnresolvedImport {
        /// The file containing the import directive.
        importer: Utf8PathBuf,
        /// The import target as written in the source.
        import: String,
    },

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// An import directive pattern failed to compile.
    #[error("invalid import pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ResolveError {
    /// Creates a new [`ResolveError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::EntryNotFound(path) | Self::Read { path, .. } => Some(path),
            Self::UnresolvedImport { importer, .. } => Some(importer),
            Self::NonUtf8Path(_) | Self::Pattern(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_entry_not_found_display() {
        let err = ResolveError::EntryNotFound(Utf8PathBuf::from("/p/main.scss"));
        assert_eq!(err.to_string(), "entry point not found: /p/main.scss");
        assert_eq!(err.path().map(|p| p.as_str()), Some("/p/main.scss"));
    }

    #[test]
    fn test_unresolved_import_points_at_importer() {
        let err = ResolveError::UnresolvedImport {
            importer: Utf8PathBuf::from("/p/main.scss"),
            import: "missing".to_string(),
        };
        assert!(err.to_string().contains("'missing'"));
        assert_eq!(err.path().map(|p| p.as_str()), Some("/p/main.scss"));
    }

    #[test]
    fn test_read_error_keeps_source() {
        let err = ResolveError::read(
            "/p/_a.scss",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("failed to read /p/_a.scss"));
    }
}
