//! Configuration structures for stylewatch.
//!
//! - [`WatchOptions`] - What to watch: search paths, scope root, extensions, verbosity
//! - [`WatchConfig`] - How to watch: debouncing and recursion of the observers
//! - [`Config`] - Root configuration combining both, loadable from JSON
//!
//! All configuration types implement [`Default`] and deserialize with
//! `#[serde(default)]`, so a config file only needs the keys it overrides.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::{current_dir, normalize_path};
use crate::types::{RelevantExtensions, Verbosity};

/// Options fixed when a watcher is constructed.
///
/// # Examples
///
/// ```
/// use sw_core::WatchOptions;
/// use camino::Utf8Path;
///
/// let options = WatchOptions::default()
///     .with_search_path("vendor/styles")
///     .normalized_against(Utf8Path::new("/project"));
///
/// assert_eq!(options.search_paths[0], "/project/vendor/styles");
/// assert_eq!(options.scope_root(), Utf8Path::new("/project"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Extra directories searched when resolving imports.
    pub search_paths: Vec<Utf8PathBuf>,

    /// Directory bounding the structural (coarse) observer.
    ///
    /// `None` means the process working directory.
    pub scope_root: Option<Utf8PathBuf>,

    /// Diagnostic verbosity (0–3).
    pub verbosity: Verbosity,

    /// Extensions that can affect a compiled stylesheet.
    pub extensions: RelevantExtensions,

    /// Treat an import that cannot be located as a resolution error.
    ///
    /// When `false`, unresolvable imports are skipped and the importing
    /// file is still watched.
    pub strict_imports: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            scope_root: None,
            verbosity: Verbosity::default(),
            extensions: RelevantExtensions::default(),
            strict_imports: false,
        }
    }
}

impl WatchOptions {
    /// Adds a search path.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Sets the scope root.
    #[must_use]
    pub fn with_scope_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.scope_root = Some(root.into());
        self
    }

    /// Sets the verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, level: u8) -> Self {
        self.verbosity = Verbosity::new(level);
        self
    }

    /// Replaces the relevant extensions.
    #[must_use]
    pub fn with_extensions(mut self, extensions: RelevantExtensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Enables or disables strict import resolution.
    #[must_use]
    pub const fn with_strict_imports(mut self, strict: bool) -> Self {
        self.strict_imports = strict;
        self
    }

    /// Returns the scope root, or `/` if it was never set.
    ///
    /// Call [`WatchOptions::normalized`] first to get the working directory
    /// substituted for an unset root.
    #[must_use]
    pub fn scope_root(&self) -> &Utf8Path {
        self.scope_root.as_deref().unwrap_or(Utf8Path::new("/"))
    }

    /// Makes every path absolute relative to `cwd` and fills in the scope root.
    #[must_use]
    pub fn normalized_against(mut self, cwd: &Utf8Path) -> Self {
        self.search_paths = self
            .search_paths
            .iter()
            .map(|path| normalize_path(cwd, path))
            .collect();
        self.search_paths.dedup();
        self.scope_root = Some(match &self.scope_root {
            Some(root) => normalize_path(cwd, root),
            None => cwd.to_owned(),
        });
        self
    }

    /// Makes every path absolute relative to the process working directory.
    pub fn normalized(self) -> Result<Self, ConfigError> {
        let cwd = current_dir()?;
        Ok(self.normalized_against(&cwd))
    }

    /// Checks the options for values the watcher cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::invalid_option(
                "extensions",
                "at least one extension is required",
            ));
        }

        if let Some(root) = &self.scope_root
            && !root.is_dir()
        {
            return Err(ConfigError::MissingDirectory(root.clone()));
        }

        Ok(())
    }
}

/// Configuration for the filesystem observers.
///
/// # Examples
///
/// ```
/// use sw_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.debounce_ms, 50);
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce window for content-change events, in milliseconds.
    ///
    /// Editors often write a file several times per save; writes within
    /// this window collapse into one `change`.
    pub debounce_ms: u64,

    /// Whether the scope observer descends into subdirectories.
    pub recursive: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            recursive: true,
        }
    }
}

/// Root configuration for stylewatch.
///
/// # Examples
///
/// ```
/// use sw_core::Config;
///
/// let config = Config::from_json_str(r#"{"options": {"verbosity": 2}}"#).unwrap();
/// assert_eq!(config.options.verbosity.level(), 2);
/// assert_eq!(config.watch.debounce_ms, 50);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Observer configuration.
    pub watch: WatchConfig,

    /// Watch options.
    pub options: WatchOptions,
}

impl Config {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
