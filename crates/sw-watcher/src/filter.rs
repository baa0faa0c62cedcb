//! Event filtering for the scope observer.
//!
//! Filtering happens on the observer thread, before events reach the driver
//! loop, so irrelevant filesystem noise never triggers a graph recomputation.
//!
//! # Examples
//!
//! ```
//! use sw_watcher::{FileFilter, FsEvent, FsEventKind, RelevantPathFilter};
//!
//! let filter = RelevantPathFilter::default();
//!
//! assert!(filter.should_process(&FsEvent::new(FsEventKind::Add, "/p/_a.scss".into())));
//! assert!(filter.should_process(&FsEvent::new(FsEventKind::AddDir, "/p/partials".into())));
//! assert!(!filter.should_process(&FsEvent::new(FsEventKind::Add, "/p/app.ts".into())));
//! ```

use sw_core::RelevantExtensions;

use crate::events::FsEvent;

/// A filter for determining which events to forward.
///
/// Filters must be [`Send`] and [`Sync`] because they run on the `notify`
/// backend thread, and `'static` to be moved into it.
///
/// # Examples
///
/// ```
/// use sw_watcher::{FileFilter, FsEvent};
///
/// struct AcceptAll;
///
/// impl FileFilter for AcceptAll {
///     fn should_process(&self, _event: &FsEvent) -> bool {
///         true
///     }
/// }
/// ```
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if the event should be sent to the channel.
    fn should_process(&self, event: &FsEvent) -> bool;
}

/// Passes structural events on directories and on files with a relevant extension.
///
/// Everything else is ignored: content changes (the watch-set observer
/// handles those), files with other extensions, and files without one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevantPathFilter {
    extensions: RelevantExtensions,
}

impl RelevantPathFilter {
    /// Creates a filter for the given extensions.
    #[must_use]
    pub const fn new(extensions: RelevantExtensions) -> Self {
        Self { extensions }
    }

    /// Returns the extensions this filter accepts.
    #[inline]
    #[must_use]
    pub const fn extensions(&self) -> &RelevantExtensions {
        &self.extensions
    }
}

impl FileFilter for RelevantPathFilter {
    fn should_process(&self, event: &FsEvent) -> bool {
        if !event.kind.is_structural() {
            return false;
        }
        event.kind.is_directory() || self.extensions.matches(&event.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FsEventKind;

    fn event(kind: FsEventKind, path: &str) -> FsEvent {
        FsEvent::new(kind, path.into())
    }

    #[test]
    fn test_default_accepts_stylesheets() {
        let filter = RelevantPathFilter::default();
        for path in ["/p/a.scss", "/p/_b.sass", "/p/c.css", "/p/D.SCSS"] {
            assert!(filter.should_process(&event(FsEventKind::Add, path)), "{path}");
            assert!(filter.should_process(&event(FsEventKind::Unlink, path)), "{path}");
        }
    }

    #[test]
    fn test_rejects_other_files() {
        let filter = RelevantPathFilter::default();
        assert!(!filter.should_process(&event(FsEventKind::Add, "/p/readme.md")));
        assert!(!filter.should_process(&event(FsEventKind::Add, "/p/Makefile")));
        assert!(!filter.should_process(&event(FsEventKind::Unlink, "/p/.gitignore")));
    }

    #[test]
    fn test_accepts_directories() {
        let filter = RelevantPathFilter::default();
        assert!(filter.should_process(&event(FsEventKind::AddDir, "/p/partials")));
        assert!(filter.should_process(&event(FsEventKind::UnlinkDir, "/p/v1.2")));
    }

    #[test]
    fn test_rejects_content_changes() {
        let filter = RelevantPathFilter::default();
        assert!(!filter.should_process(&event(FsEventKind::Change, "/p/a.scss")));
    }

    #[test]
    fn test_css_only_ignores_new_scss() {
        let filter = RelevantPathFilter::new(RelevantExtensions::new(["css"]));
        assert!(!filter.should_process(&event(FsEventKind::Add, "/p/_new.scss")));
        assert!(filter.should_process(&event(FsEventKind::Add, "/p/new.css")));
    }
}
