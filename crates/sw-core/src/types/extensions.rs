//! File extensions relevant to the watcher.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Default stylesheet extensions: Sass (SCSS and indented syntax) and CSS.
const DEFAULT_EXTENSIONS: [&str; 3] = ["scss", "sass", "css"];

/// The set of file extensions that can affect a compiled stylesheet.
///
/// Extensions are stored lowercase and without a leading dot, in the order
/// they were supplied. That order is also the order in which the resolver
/// tries candidate files for an import. Matching is case-insensitive.
///
/// # Examples
///
/// ```
/// use sw_core::RelevantExtensions;
/// use camino::Utf8Path;
///
/// let extensions = RelevantExtensions::default();
/// assert!(extensions.matches(Utf8Path::new("styles/_vars.scss")));
/// assert!(extensions.matches(Utf8Path::new("theme.CSS")));
/// assert!(!extensions.matches(Utf8Path::new("app.ts")));
///
/// let css_only = RelevantExtensions::new([".css"]);
/// assert!(!css_only.matches(Utf8Path::new("main.scss")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RelevantExtensions {
    extensions: SmallVec<[String; 4]>,
}

impl RelevantExtensions {
    /// Creates an extension set, stripping leading dots and duplicates.
    #[must_use]
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: SmallVec<[String; 4]> = SmallVec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() && !set.contains(&ext) {
                set.push(ext);
            }
        }
        Self { extensions: set }
    }

    /// Returns `true` if `ext` (without a leading dot) is in the set.
    #[must_use]
    pub fn contains(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Returns `true` if the path ends in one of the relevant extensions.
    #[must_use]
    pub fn matches(&self, path: &Utf8Path) -> bool {
        path.extension().is_some_and(|ext| self.contains(ext))
    }

    /// Iterates over the extensions in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Returns the number of extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Returns `true` if no extension is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for RelevantExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl From<Vec<String>> for RelevantExtensions {
    fn from(extensions: Vec<String>) -> Self {
        Self::new(extensions)
    }
}

impl From<RelevantExtensions> for Vec<String> {
    fn from(extensions: RelevantExtensions) -> Self {
        extensions.extensions.into_vec()
    }
}

impl std::fmt::Display for RelevantExtensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.extensions.join("|"))
    }
}
