//! Filesystem events and watcher notifications.
//!
//! # Event Flow
//!
//! ```text
//! notify::Event (raw, backend specific)
//!        │
//!        ▼
//!   classify()  ──►  FsEvent { Add | AddDir | Unlink | UnlinkDir | Change }
//!        │
//!        ▼
//!   FileFilter  ──►  driver loop  ──►  WatchSetCoordinator
//!                                            │
//!                                            ▼
//!                                Notification { Init | Update | Error }
//! ```

use std::fmt;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The kind of a filesystem event as seen by the watcher.
///
/// The four structural kinds come from the scope observer; [`FsEventKind::Change`]
/// comes from the watch-set observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FsEventKind {
    /// A file was created (or moved into place).
    Add,
    /// A directory was created (or moved into place).
    AddDir,
    /// A file was removed (or moved away).
    Unlink,
    /// A directory was removed (or moved away).
    UnlinkDir,
    /// A watched file's content changed.
    Change,
}

impl FsEventKind {
    /// Returns the conventional event name (`add`, `addDir`, ...).
    ///
    /// # Examples
    ///
    /// ```
    /// use sw_watcher::FsEventKind;
    ///
    /// assert_eq!(FsEventKind::UnlinkDir.as_str(), "unlinkDir");
    /// ```
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::AddDir => "addDir",
            Self::Unlink => "unlink",
            Self::UnlinkDir => "unlinkDir",
            Self::Change => "change",
        }
    }

    /// Returns `true` for creations and removals.
    #[inline]
    #[must_use]
    pub const fn is_structural(self) -> bool {
        !matches!(self, Self::Change)
    }

    /// Returns `true` if the event concerns a directory.
    #[inline]
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::AddDir | Self::UnlinkDir)
    }
}

impl fmt::Display for FsEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified filesystem event with a UTF-8 path.
///
/// # Examples
///
/// ```
/// use sw_watcher::{FsEvent, FsEventKind};
///
/// let event = FsEvent::new(FsEventKind::Add, "/project/_new.scss".into());
/// assert_eq!(event.describe(), "New file \"/project/_new.scss\" is added");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FsEvent {
    /// What happened.
    pub kind: FsEventKind,
    /// Where it happened. Absolute.
    pub path: Utf8PathBuf,
}

impl FsEvent {
    /// Creates a new event.
    #[inline]
    #[must_use]
    pub const fn new(kind: FsEventKind, path: Utf8PathBuf) -> Self {
        Self { kind, path }
    }

    /// Returns a human-readable description for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        let path = &self.path;
        match self.kind {
            FsEventKind::Add => format!("New file \"{path}\" is added"),
            FsEventKind::AddDir => format!("New directory \"{path}\" is added"),
            FsEventKind::Unlink => format!("File \"{path}\" is removed"),
            FsEventKind::UnlinkDir => format!("Directory \"{path}\" is removed"),
            FsEventKind::Change => format!("File \"{path}\" is modified"),
        }
    }
}

/// A notification emitted to watcher subscribers.
///
/// Notifications carry no watch-set payload; subscribers re-query
/// [`StyleWatcher::included_files`](crate::StyleWatcher::included_files) if
/// they need it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event", content = "message", rename_all = "lowercase")]
pub enum Notification {
    /// Emitted exactly once, after construction, before any `Update`.
    Init,
    /// The watch-set changed, or a watched file's content changed.
    Update,
    /// Resolving the dependency graph failed; the watch-set was left unchanged.
    Error(String),
}

impl Notification {
    /// Returns the notification name (`init`, `update` or `error`).
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Update => "update",
            Self::Error(_) => "error",
        }
    }
}

/// Maps a raw `notify` event onto zero or more [`FsEvent`]s.
///
/// Backends differ in how precisely they report kinds. When the backend does
/// not say whether a path is a file or a directory, created paths are
/// inspected on disk; removed paths no longer exist, so a path without an
/// extension is taken to be a directory. Renames become an unlink of the old
/// path and an add of the new one. Access and metadata events are dropped.
///
/// Non-UTF-8 paths are logged and skipped.
#[must_use]
pub fn classify(event: &notify::Event) -> SmallVec<[FsEvent; 2]> {
    let paths: SmallVec<[Utf8PathBuf; 2]> = event.paths.iter().filter_map(|p| to_utf8(p)).collect();
    let mut events: SmallVec<[FsEvent; 2]> = SmallVec::new();

    match event.kind {
        EventKind::Create(kind) => {
            for path in paths {
                let kind = match kind {
                    CreateKind::File => FsEventKind::Add,
                    CreateKind::Folder => FsEventKind::AddDir,
                    CreateKind::Any | CreateKind::Other => addition_kind(&path),
                };
                events.push(FsEvent::new(kind, path));
            }
        }
        EventKind::Remove(kind) => {
            for path in paths {
                let kind = match kind {
                    RemoveKind::File => FsEventKind::Unlink,
                    RemoveKind::Folder => FsEventKind::UnlinkDir,
                    RemoveKind::Any | RemoveKind::Other => removal_kind(&path),
                };
                events.push(FsEvent::new(kind, path));
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => {
                events.extend(paths.into_iter().map(|p| FsEvent::new(removal_kind(&p), p)));
            }
            RenameMode::To => {
                events.extend(paths.into_iter().map(|p| FsEvent::new(addition_kind(&p), p)));
            }
            RenameMode::Both => {
                let mut paths = paths.into_iter();
                if let Some(from) = paths.next() {
                    events.push(FsEvent::new(removal_kind(&from), from));
                }
                if let Some(to) = paths.next() {
                    events.push(FsEvent::new(addition_kind(&to), to));
                }
            }
            RenameMode::Any | RenameMode::Other => {
                for path in paths {
                    let kind = if path.exists() {
                        addition_kind(&path)
                    } else {
                        removal_kind(&path)
                    };
                    events.push(FsEvent::new(kind, path));
                }
            }
        },
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => {
            events.extend(
                paths
                    .into_iter()
                    .filter(|p| p.is_file())
                    .map(|p| FsEvent::new(FsEventKind::Change, p)),
            );
        }
        EventKind::Modify(_) | EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
    }

    events
}

fn addition_kind(path: &Utf8Path) -> FsEventKind {
    if path.is_dir() {
        FsEventKind::AddDir
    } else {
        FsEventKind::Add
    }
}

fn removal_kind(path: &Utf8Path) -> FsEventKind {
    if path.extension().is_some() {
        FsEventKind::Unlink
    } else {
        FsEventKind::UnlinkDir
    }
}

/// Converts a path to UTF-8, logging and dropping it otherwise.
pub(crate) fn to_utf8(path: &Path) -> Option<Utf8PathBuf> {
    match Utf8PathBuf::try_from(path.to_path_buf()) {
        Ok(path) => Some(path),
        Err(e) => {
            let invalid_path = e.into_path_buf();
            tracing::warn!(
                path = %invalid_path.display(),
                "Skipping non-UTF-8 path in file event"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, MetadataKind};
    use std::path::PathBuf;

    fn raw(kind: EventKind, paths: &[&str]) -> notify::Event {
        let mut event = notify::Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    fn kinds(events: &[FsEvent]) -> Vec<FsEventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_create_kinds() {
        let file = classify(&raw(EventKind::Create(CreateKind::File), &["/p/_a.scss"]));
        assert_eq!(kinds(&file), vec![FsEventKind::Add]);
        assert_eq!(file[0].path, "/p/_a.scss");

        let dir = classify(&raw(EventKind::Create(CreateKind::Folder), &["/p/partials"]));
        assert_eq!(kinds(&dir), vec![FsEventKind::AddDir]);
    }

    #[test]
    fn test_remove_kinds() {
        let file = classify(&raw(EventKind::Remove(RemoveKind::File), &["/p/_a.scss"]));
        assert_eq!(kinds(&file), vec![FsEventKind::Unlink]);

        let dir = classify(&raw(EventKind::Remove(RemoveKind::Folder), &["/p/partials"]));
        assert_eq!(kinds(&dir), vec![FsEventKind::UnlinkDir]);
    }

    #[test]
    fn test_ambiguous_remove_guesses_from_extension() {
        let events = classify(&raw(
            EventKind::Remove(RemoveKind::Any),
            &["/gone/_a.scss", "/gone/partials"],
        ));
        assert_eq!(kinds(&events), vec![FsEventKind::Unlink, FsEventKind::UnlinkDir]);
    }

    #[test]
    fn test_rename_both_is_unlink_then_add() {
        let events = classify(&raw(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/gone/old.scss", "/gone/new.scss"],
        ));
        assert_eq!(kinds(&events), vec![FsEventKind::Unlink, FsEventKind::Add]);
        assert_eq!(events[1].path, "/gone/new.scss");
    }

    #[test]
    fn test_rename_from_is_unlink() {
        let events = classify(&raw(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/gone/old.scss"],
        ));
        assert_eq!(kinds(&events), vec![FsEventKind::Unlink]);
    }

    #[test]
    fn test_access_and_metadata_are_dropped() {
        assert!(classify(&raw(EventKind::Access(AccessKind::Any), &["/p/a.scss"])).is_empty());
        assert!(
            classify(&raw(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)),
                &["/p/a.scss"]
            ))
            .is_empty()
        );
    }

    #[test]
    fn test_data_change_on_missing_file_is_dropped() {
        let events = classify(&raw(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/definitely/not/here.scss"],
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn test_descriptions() {
        let path = Utf8PathBuf::from("/p/a.scss");
        assert_eq!(
            FsEvent::new(FsEventKind::Unlink, path.clone()).describe(),
            "File \"/p/a.scss\" is removed"
        );
        assert_eq!(
            FsEvent::new(FsEventKind::Change, path).describe(),
            "File \"/p/a.scss\" is modified"
        );
    }

    #[test]
    fn test_kind_predicates() {
        assert!(FsEventKind::AddDir.is_structural());
        assert!(FsEventKind::AddDir.is_directory());
        assert!(!FsEventKind::Change.is_structural());
        assert!(!FsEventKind::Unlink.is_directory());
    }

    #[test]
    fn test_notification_serialization() {
        let json = serde_json::to_string(&Notification::Update).expect("serializable");
        assert_eq!(json, r#"{"event":"update"}"#);
        let json = serde_json::to_string(&Notification::Error("boom".into())).expect("serializable");
        assert_eq!(json, r#"{"event":"error","message":"boom"}"#);
        assert_eq!(Notification::Init.as_str(), "init");
    }
}
