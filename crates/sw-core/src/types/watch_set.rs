//! The watch-set and the diff produced by recomputing it.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::hash::FxHashSet;

/// The set of files currently believed to affect at least one entry point.
///
/// Paths are unique by construction. Iteration order is unspecified; use
/// [`WatchSet::sorted`] when a stable order is needed (diagnostics, JSON
/// output, tests).
///
/// # Examples
///
/// ```
/// use sw_core::WatchSet;
/// use camino::Utf8PathBuf;
///
/// let set: WatchSet = ["/p/a.scss", "/p/b.scss", "/p/a.scss"]
///     .into_iter()
///     .map(Utf8PathBuf::from)
///     .collect();
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchSet {
    paths: FxHashSet<Utf8PathBuf>,
}

impl WatchSet {
    /// Creates an empty watch-set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a path, returning `true` if it was not already present.
    #[inline]
    pub fn insert(&mut self, path: Utf8PathBuf) -> bool {
        self.paths.insert(path)
    }

    /// Returns `true` if the path is in the set.
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.contains(path)
    }

    /// Returns the number of paths.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates over the paths in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.paths.iter()
    }

    /// Returns the paths sorted lexicographically.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Utf8Path> {
        let mut paths: Vec<&Utf8Path> = self.paths.iter().map(Utf8PathBuf::as_path).collect();
        paths.sort_unstable();
        paths
    }

    /// Computes the difference between this set and a freshly resolved one.
    ///
    /// `added` holds paths present only in `candidate`, `removed` holds paths
    /// present only in `self`. A path present in both sets appears in neither
    /// list, whatever happened to its content.
    #[must_use]
    pub fn diff(&self, candidate: &Self) -> WatchSetDiff {
        let mut added: Vec<Utf8PathBuf> = candidate.paths.difference(&self.paths).cloned().collect();
        let mut removed: Vec<Utf8PathBuf> =
            self.paths.difference(&candidate.paths).cloned().collect();
        added.sort_unstable();
        removed.sort_unstable();
        WatchSetDiff { added, removed }
    }
}

impl FromIterator<Utf8PathBuf> for WatchSet {
    fn from_iter<T: IntoIterator<Item = Utf8PathBuf>>(iter: T) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl Extend<Utf8PathBuf> for WatchSet {
    fn extend<T: IntoIterator<Item = Utf8PathBuf>>(&mut self, iter: T) {
        self.paths.extend(iter);
    }
}

impl IntoIterator for WatchSet {
    type Item = Utf8PathBuf;
    type IntoIter = std::collections::hash_set::IntoIter<Utf8PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// Paths that entered and left the watch-set during one recomputation.
///
/// Both lists are sorted and disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSetDiff {
    /// Paths that must start being watched.
    pub added: Vec<Utf8PathBuf>,

    /// Paths that must stop being watched.
    pub removed: Vec<Utf8PathBuf>,
}

impl WatchSetDiff {
    /// Returns `true` if nothing was added or removed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Applies the diff to a previous watch-set: `(previous − removed) ∪ added`.
    #[must_use]
    pub fn apply_to(&self, previous: &WatchSet) -> WatchSet {
        let mut next: WatchSet = previous
            .iter()
            .filter(|path| !self.removed.contains(path))
            .cloned()
            .collect();
        next.extend(self.added.iter().cloned());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> WatchSet {
        paths.iter().copied().map(Utf8PathBuf::from).collect()
    }

    #[test]
    fn test_diff_reports_added_and_removed() {
        let old = set(&["/p/a.scss", "/p/b.scss"]);
        let new = set(&["/p/a.scss", "/p/c.scss"]);

        let diff = old.diff(&new);
        assert_eq!(diff.added, vec![Utf8PathBuf::from("/p/c.scss")]);
        assert_eq!(diff.removed, vec![Utf8PathBuf::from("/p/b.scss")]);
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_diff_of_equal_sets_is_empty() {
        let a = set(&["/p/a.scss", "/p/b.scss"]);
        assert!(a.diff(&a.clone()).is_empty());
    }

    #[test]
    fn test_apply_to_reconstructs_candidate() {
        let old = set(&["/p/a.scss", "/p/b.scss", "/p/d.scss"]);
        let new = set(&["/p/a.scss", "/p/c.scss"]);

        let diff = old.diff(&new);
        assert_eq!(diff.apply_to(&old), new);
        assert!(diff.added.iter().all(|p| !diff.removed.contains(p)));
    }

    #[test]
    fn test_sorted_is_stable() {
        let s = set(&["/p/z.scss", "/p/a.scss", "/p/m.sass"]);
        assert_eq!(s.sorted(), vec!["/p/a.scss", "/p/m.sass", "/p/z.scss"]);
    }

    #[test]
    fn test_serializes_as_list() {
        let s = set(&["/p/a.scss"]);
        let json = serde_json::to_string(&s).expect("serializable");
        assert_eq!(json, r#"["/p/a.scss"]"#);
    }
}
