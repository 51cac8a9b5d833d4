//! Review session state machine.
//!
//! A [`ReviewSession`] is a value: every reviewer action goes through
//! [`ReviewSession::apply`], which returns the next session and leaves the
//! current one untouched. Front-ends keep the latest value and autosave it.

use serde::Serialize;
use tracing::debug;

use mirreview_shared::{LoadedDocument, PublicationRecord, ReviewSnapshot};

/// Reviewer's edit of the record under the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewEdit {
    pub assigned_topics: Vec<String>,
    pub notes: String,
}

impl ReviewEdit {
    pub fn new(assigned_topics: Vec<String>, notes: impl Into<String>) -> Self {
        Self {
            assigned_topics,
            notes: notes.into(),
        }
    }

    /// Prefill from a record's current values.
    pub fn from_record(record: &PublicationRecord) -> Self {
        Self::new(record.assigned_topics.clone(), record.notes.clone())
    }
}

/// Actions a reviewer can take.
#[derive(Debug, Clone)]
pub enum ReviewAction {
    /// Replace everything with a freshly ingested document.
    Load(LoadedDocument),
    /// Store the edit and move to the next record.
    SaveAndNext(ReviewEdit),
    /// Move to the next record without storing anything.
    Skip,
    /// Store the edit and move back one record. Ignored on the first record.
    Previous(ReviewEdit),
    /// Move the cursor to `index`, clamped to the document.
    Jump(usize),
    /// Resume an autosaved review.
    Restore {
        document: LoadedDocument,
        cursor: usize,
    },
    /// Drop the document and return to the empty state.
    StartOver,
}

/// Position within the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub position: usize,
    pub total: usize,
    /// Whole percent, rounded down.
    pub percent: u8,
}

/// Whether a topic was added to or removed from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
}

/// One entry of the changes summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicChange {
    pub identifier: String,
    pub topic: String,
    pub kind: ChangeKind,
}

impl std::fmt::Display for TopicChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ChangeKind::Added => write!(f, "+ {} -> {}", self.identifier, self.topic),
            ChangeKind::Removed => {
                write!(f, "- {} removed from {}", self.identifier, self.topic)
            }
        }
    }
}

/// Document under review plus the reviewer's cursor.
///
/// `cursor == publications.len()` means the review is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSession {
    document: Option<LoadedDocument>,
    cursor: usize,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from an autosave snapshot.
    pub fn from_snapshot(snapshot: ReviewSnapshot) -> Self {
        Self::new().apply(ReviewAction::Restore {
            document: snapshot.document,
            cursor: snapshot.cursor,
        })
    }

    /// Snapshot for autosave, or `None` when nothing is loaded.
    pub fn snapshot(&self) -> Option<ReviewSnapshot> {
        self.document
            .as_ref()
            .map(|doc| ReviewSnapshot::new(doc.clone(), self.cursor))
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn publications(&self) -> &[PublicationRecord] {
        self.document
            .as_ref()
            .map(|d| d.publications.as_slice())
            .unwrap_or_default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Record under the cursor, if the review is still in progress.
    pub fn current(&self) -> Option<&PublicationRecord> {
        self.publications().get(self.cursor)
    }

    /// A document is loaded and the cursor is past its last record.
    pub fn is_complete(&self) -> bool {
        self.is_loaded() && self.cursor >= self.publications().len()
    }

    pub fn progress(&self) -> Progress {
        let total = self.publications().len();
        let position = self.cursor.min(total);
        let percent = if total == 0 {
            100
        } else {
            (position * 100 / total) as u8
        };
        Progress {
            position,
            total,
            percent,
        }
    }

    /// Topics added or removed per record, in record order.
    pub fn changes(&self) -> Vec<TopicChange> {
        let mut changes = Vec::new();
        for record in self.publications() {
            for topic in &record.assigned_topics {
                if !record.original_topics.contains(topic) {
                    changes.push(TopicChange {
                        identifier: record.identifier.clone(),
                        topic: topic.clone(),
                        kind: ChangeKind::Added,
                    });
                }
            }
            for topic in &record.original_topics {
                if !record.assigned_topics.contains(topic) {
                    changes.push(TopicChange {
                        identifier: record.identifier.clone(),
                        topic: topic.clone(),
                        kind: ChangeKind::Removed,
                    });
                }
            }
        }
        changes
    }

    /// Apply `action`, returning the next session.
    pub fn apply(&self, action: ReviewAction) -> ReviewSession {
        let mut next = self.clone();
        match action {
            ReviewAction::Load(document) => {
                debug!(file = %document.file_name, records = document.publications.len(), "load");
                next.document = Some(document);
                next.cursor = 0;
            }
            ReviewAction::Restore { document, cursor } => {
                next.cursor = cursor.min(document.publications.len());
                next.document = Some(document);
            }
            ReviewAction::StartOver => {
                next.document = None;
                next.cursor = 0;
            }
            ReviewAction::SaveAndNext(edit) => {
                if next.store(edit) {
                    next.cursor += 1;
                }
            }
            ReviewAction::Skip => {
                if next.current().is_some() {
                    next.cursor += 1;
                }
            }
            ReviewAction::Previous(edit) => {
                if next.cursor > 0 {
                    next.store(edit);
                    next.cursor -= 1;
                }
            }
            ReviewAction::Jump(index) => {
                next.cursor = index.min(next.publications().len());
            }
        }
        next
    }

    /// Write `edit` into the record under the cursor. Returns `false` when
    /// there is no such record.
    fn store(&mut self, edit: ReviewEdit) -> bool {
        let cursor = self.cursor;
        let Some(record) = self
            .document
            .as_mut()
            .and_then(|d| d.publications.get_mut(cursor))
        else {
            return false;
        };

        let mut assigned: Vec<String> = Vec::with_capacity(edit.assigned_topics.len());
        for topic in edit.assigned_topics {
            if !assigned.contains(&topic) {
                assigned.push(topic);
            }
        }
        record.assigned_topics = assigned;
        record.notes = edit.notes;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirreview_shared::{DocumentFingerprint, ParseStats};

    fn document() -> LoadedDocument {
        LoadedDocument {
            file_name: "may.md".into(),
            fingerprint: DocumentFingerprint::of(b"may"),
            publications: vec![
                PublicationRecord::new("GAO-24-1", "One", "May 2024", "u1", Some("Energy")),
                PublicationRecord::new("GAO-24-2", "Two", "May 2024", "u2", Some("Space")),
                PublicationRecord::new("GAO-24-3", "Three", "May 2024", "u3", None),
            ],
            stats: ParseStats::default(),
        }
    }

    fn loaded() -> ReviewSession {
        ReviewSession::new().apply(ReviewAction::Load(document()))
    }

    fn edit(topics: &[&str], notes: &str) -> ReviewEdit {
        ReviewEdit::new(topics.iter().map(|t| t.to_string()).collect(), notes)
    }

    #[test]
    fn empty_session() {
        let s = ReviewSession::new();
        assert!(!s.is_loaded());
        assert!(!s.is_complete());
        assert!(s.current().is_none());
        assert!(s.snapshot().is_none());
    }

    #[test]
    fn load_resets_cursor() {
        let s = loaded().apply(ReviewAction::Skip).apply(ReviewAction::Skip);
        assert_eq!(s.cursor(), 2);
        let reloaded = s.apply(ReviewAction::Load(document()));
        assert_eq!(reloaded.cursor(), 0);
        assert_eq!(reloaded.current().unwrap().identifier, "GAO-24-1");
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let s = loaded();
        let _ = s.apply(ReviewAction::SaveAndNext(edit(&["Housing"], "x")));
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.publications()[0].assigned_topics, vec!["Energy"]);
    }

    #[test]
    fn save_and_next_stores_edit() {
        let s = loaded().apply(ReviewAction::SaveAndNext(edit(
            &["Energy", "Housing", "Energy"],
            "dual topic",
        )));
        assert_eq!(s.cursor(), 1);
        let first = &s.publications()[0];
        assert_eq!(first.assigned_topics, vec!["Energy", "Housing"]);
        assert_eq!(first.original_topics, vec!["Energy"]);
        assert_eq!(first.notes, "dual topic");
    }

    #[test]
    fn skip_keeps_record() {
        let s = loaded().apply(ReviewAction::Skip);
        assert_eq!(s.cursor(), 1);
        assert_eq!(s.publications()[0], document().publications[0]);
    }

    #[test]
    fn previous_stores_and_steps_back() {
        let s = loaded()
            .apply(ReviewAction::Skip)
            .apply(ReviewAction::Previous(edit(&[], "no topic")));
        assert_eq!(s.cursor(), 0);
        assert!(s.publications()[1].assigned_topics.is_empty());
        assert_eq!(s.publications()[1].notes, "no topic");
    }

    #[test]
    fn previous_at_start_is_noop() {
        let s = loaded();
        let after = s.apply(ReviewAction::Previous(edit(&["Housing"], "ignored")));
        assert_eq!(after, s);
    }

    #[test]
    fn completion_and_progress() {
        let mut s = loaded();
        assert_eq!(
            s.progress(),
            Progress {
                position: 0,
                total: 3,
                percent: 0
            }
        );
        s = s.apply(ReviewAction::Skip);
        assert_eq!(s.progress().percent, 33);
        s = s.apply(ReviewAction::Skip).apply(ReviewAction::Skip);
        assert!(s.is_complete());
        assert!(s.current().is_none());
        assert_eq!(s.progress().percent, 100);

        // Nothing left to advance past.
        let again = s.apply(ReviewAction::Skip);
        assert_eq!(again.cursor(), 3);
        let saved = s.apply(ReviewAction::SaveAndNext(edit(&["Housing"], "")));
        assert_eq!(saved, s);
    }

    #[test]
    fn empty_document_is_complete_immediately() {
        let mut doc = document();
        doc.publications.clear();
        let s = ReviewSession::new().apply(ReviewAction::Load(doc));
        assert!(s.is_complete());
        assert_eq!(s.progress().percent, 100);
    }

    #[test]
    fn jump_clamps() {
        let s = loaded().apply(ReviewAction::Jump(2));
        assert_eq!(s.current().unwrap().identifier, "GAO-24-3");
        assert_eq!(loaded().apply(ReviewAction::Jump(99)).cursor(), 3);
    }

    #[test]
    fn restore_clamps_cursor() {
        let s = ReviewSession::new().apply(ReviewAction::Restore {
            document: document(),
            cursor: 10,
        });
        assert!(s.is_complete());
    }

    #[test]
    fn snapshot_roundtrip() {
        let s = loaded().apply(ReviewAction::SaveAndNext(edit(&["Housing"], "moved")));
        let snap = s.snapshot().unwrap();
        assert_eq!(snap.cursor, 1);
        let json = serde_json::to_string(&snap).unwrap();
        let restored = ReviewSession::from_snapshot(serde_json::from_str(&json).unwrap());
        assert_eq!(restored, s);
    }

    #[test]
    fn start_over_clears() {
        let s = loaded().apply(ReviewAction::Skip).apply(ReviewAction::StartOver);
        assert_eq!(s, ReviewSession::new());
    }

    #[test]
    fn changes_summary() {
        let s = loaded()
            .apply(ReviewAction::SaveAndNext(edit(&["Energy", "Housing"], "")))
            .apply(ReviewAction::SaveAndNext(edit(&["Science & Technology"], "")));
        let changes = s.changes();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].to_string(), "+ GAO-24-1 -> Housing");
        assert_eq!(changes[1].kind, ChangeKind::Added);
        assert_eq!(changes[2].to_string(), "- GAO-24-2 removed from Space");
        assert!(loaded().changes().is_empty());
    }
}
