//! Lexical path normalization.
//!
//! Every path that enters the watcher (entry points, search paths, the scope
//! root, resolved imports) is made absolute and stripped of `.` and `..`
//! components without touching the filesystem. Keeping a single spelling per
//! file is what makes watch-set diffs meaningful: `a/../b.scss` and `b.scss`
//! must compare equal.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::error::ConfigError;

/// Resolves `path` against `base` and removes `.`/`..` components lexically.
///
/// Absolute paths ignore `base`. Symlinks are not followed.
///
/// # Examples
///
/// ```
/// use sw_core::normalize_path;
/// use camino::Utf8Path;
///
/// let base = Utf8Path::new("/project");
/// assert_eq!(normalize_path(base, Utf8Path::new("styles/../main.scss")), "/project/main.scss");
/// assert_eq!(normalize_path(base, Utf8Path::new("/abs/./a.scss")), "/abs/a.scss");
/// ```
#[must_use]
pub fn normalize_path(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    let joined = if path.is_absolute() {
        path.to_owned()
    } else {
        base.join(path)
    };

    let mut normalized = Utf8PathBuf::new();
    for component in joined.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}

/// Returns the process working directory as a UTF-8 path.
pub fn current_dir() -> Result<Utf8PathBuf, ConfigError> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| ConfigError::NonUtf8WorkingDir(e.into_path_buf()))
}
