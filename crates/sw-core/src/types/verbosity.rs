//! Diagnostic verbosity levels.

use serde::{Deserialize, Serialize};

/// How chatty the watcher is about what it is doing.
///
/// Verbosity only gates diagnostics; it never changes which files are
/// watched or which notifications are emitted.
///
/// | Level | Diagnostics                                              |
/// |-------|----------------------------------------------------------|
/// | 0     | none                                                     |
/// | 1     | startup message                                          |
/// | 2     | per-event descriptions and the initial watch list        |
/// | 3     | added/removed/current watch lists on every recomputation |
///
/// # Examples
///
/// ```
/// use sw_core::Verbosity;
///
/// let v = Verbosity::new(7);
/// assert_eq!(v.level(), 3);
/// assert!(v.dumps_watch_set());
/// assert!(!Verbosity::default().announces_startup());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct Verbosity(u8);

impl Verbosity {
    /// The highest meaningful level.
    pub const MAX: u8 = 3;

    /// Creates a verbosity level, clamping anything above [`Verbosity::MAX`].
    #[inline]
    #[must_use]
    pub const fn new(level: u8) -> Self {
        if level > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(level)
        }
    }

    /// Returns the numeric level (0–3).
    #[inline]
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Level 1 and above: announce which entry points are watched.
    #[inline]
    #[must_use]
    pub const fn announces_startup(self) -> bool {
        self.0 >= 1
    }

    /// Level 2 and above: describe each triggering filesystem event.
    #[inline]
    #[must_use]
    pub const fn describes_events(self) -> bool {
        self.0 >= 2
    }

    /// Level 3: dump the watch-set diff on every recomputation.
    #[inline]
    #[must_use]
    pub const fn dumps_watch_set(self) -> bool {
        self.0 >= 3
    }
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<Verbosity> for u8 {
    fn from(verbosity: Verbosity) -> Self {
        verbosity.0
    }
}
