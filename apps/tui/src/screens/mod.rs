//! TUI screen definitions.
//!
//! The review moves through three screens in order. Screens own their
//! input state and rendering; anything touching the session, the ingestor
//! or the autosave store is returned as an [`Intent`] for the app to run.

pub(crate) mod load;
pub(crate) mod review;
pub(crate) mod summary;

use std::fmt;
use std::path::PathBuf;

use mirreview_core::{ExportKind, ReviewAction};
use mirreview_shared::DocumentFingerprint;

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Load,
    Review,
    Summary,
}

impl ScreenId {
    pub(crate) const ALL: [ScreenId; 3] = [Self::Load, Self::Review, Self::Summary];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Load => 0,
            Self::Review => 1,
            Self::Summary => 2,
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "Load"),
            Self::Review => write!(f, "Review"),
            Self::Summary => write!(f, "Summary"),
        }
    }
}

/// Work a screen asks the app to do.
#[derive(Debug)]
pub(crate) enum Intent {
    /// Ingest a document from disk.
    LoadFile(PathBuf),
    /// Resume an autosaved review.
    Resume(DocumentFingerprint),
    /// Refresh the autosave list.
    RefreshAutosaves,
    /// Apply a session transition.
    Review(ReviewAction),
    /// Write an export to the output directory.
    Export(ExportKind),
    /// Go back to the load screen.
    OpenLoad,
}
