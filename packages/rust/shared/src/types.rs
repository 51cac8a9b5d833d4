//! Core domain types for publication review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current schema version for autosave snapshots.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// PublicationRecord
// ---------------------------------------------------------------------------

/// One publication from a review document, unique by `identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Canonical publication number, e.g. `GAO-24-105123`.
    pub identifier: String,
    /// Title assembled from the bold title block.
    pub title: String,
    /// Free-text date from the metadata line; empty when the line had none.
    pub date: String,
    /// Canonical product URL.
    pub source_url: String,
    /// Topics the publication was filed under in the source document.
    pub original_topics: Vec<String>,
    /// Topics chosen by the reviewer.
    pub assigned_topics: Vec<String>,
    /// Reviewer notes.
    #[serde(default)]
    pub notes: String,
}

impl PublicationRecord {
    /// Build a record with both topic lists seeded from `topic`.
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        date: impl Into<String>,
        source_url: impl Into<String>,
        topic: Option<&str>,
    ) -> Self {
        let topics: Vec<String> = topic.map(str::to_string).into_iter().collect();
        Self {
            identifier: identifier.into(),
            title: title.into(),
            date: date.into(),
            source_url: source_url.into(),
            original_topics: topics.clone(),
            assigned_topics: topics,
            notes: String::new(),
        }
    }

    /// Whether the reviewer's topics differ from the source document's.
    pub fn is_reassigned(&self) -> bool {
        self.original_topics != self.assigned_topics
    }
}

// ---------------------------------------------------------------------------
// ParseStats
// ---------------------------------------------------------------------------

/// Counters collected while parsing one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Candidate records emitted by the extractor.
    pub candidates: usize,
    /// Title blocks discarded for lack of an identifier or title.
    pub dropped_blocks: usize,
    /// Candidates folded into an existing record.
    pub duplicates_merged: usize,
    /// Records in the final list.
    pub records: usize,
}

// ---------------------------------------------------------------------------
// DocumentFingerprint
// ---------------------------------------------------------------------------

/// SHA-256 of an uploaded document's raw bytes, hex-encoded.
///
/// Identifies "the same file" across sessions: autosaves are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentFingerprint(pub String);

impl DocumentFingerprint {
    /// Fingerprint raw document bytes.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(self.0.as_str())
    }
}

impl std::fmt::Display for DocumentFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LoadedDocument
// ---------------------------------------------------------------------------

/// A fully parsed document, ready to be placed into a review session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedDocument {
    /// File name as uploaded (the "loaded file" marker).
    pub file_name: String,
    /// Fingerprint of the raw upload.
    pub fingerprint: DocumentFingerprint,
    /// Parsed publications, sorted by identifier.
    pub publications: Vec<PublicationRecord>,
    /// Parser counters for this document.
    #[serde(default)]
    pub stats: ParseStats,
}

// ---------------------------------------------------------------------------
// ReviewSnapshot
// ---------------------------------------------------------------------------

/// Autosaved review state for crash recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// The document under review, including reviewer edits.
    pub document: LoadedDocument,
    /// Reviewer cursor at the time of saving.
    pub cursor: usize,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}

impl ReviewSnapshot {
    /// Snapshot `document` at `cursor`, stamped with the current time.
    pub fn new(document: LoadedDocument, cursor: usize) -> Self {
        Self {
            schema_version: CURRENT_SNAPSHOT_VERSION,
            document,
            cursor,
            saved_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_seeds_both_topic_lists() {
        let rec = PublicationRecord::new(
            "GAO-24-105123",
            "Report on Schools",
            "March 2024",
            "https://www.gao.gov/products/GAO-24-105123",
            Some("Education"),
        );
        assert_eq!(rec.original_topics, vec!["Education"]);
        assert_eq!(rec.assigned_topics, rec.original_topics);
        assert!(rec.notes.is_empty());
        assert!(!rec.is_reassigned());
    }

    #[test]
    fn new_record_without_topic_has_empty_lists() {
        let rec = PublicationRecord::new("GAO-24-1", "T", "", "u", None);
        assert!(rec.original_topics.is_empty());
        assert!(rec.assigned_topics.is_empty());
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = DocumentFingerprint::of(b"month in review");
        let b = DocumentFingerprint::of(b"month in review");
        let c = DocumentFingerprint::of(b"month in review!");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.0.len(), 64);
        assert_eq!(a.short().len(), 12);
    }

    #[test]
    fn short_fingerprint_tolerates_foreign_text() {
        // A stored fingerprint is a plain string and need not be hex.
        let odd = DocumentFingerprint("ééééééé".into());
        assert_eq!(odd.short(), "éééééé");
        let tiny = DocumentFingerprint("abc".into());
        assert_eq!(tiny.short(), "abc");
        let split = DocumentFingerprint("abcdefghijkü".into());
        assert_eq!(split.short(), "abcdefghijkü");
    }

    #[test]
    fn record_notes_default_when_missing() {
        let json = r#"{
            "identifier": "GAO-24-1",
            "title": "T",
            "date": "",
            "source_url": "https://www.gao.gov/products/GAO-24-1",
            "original_topics": ["Energy"],
            "assigned_topics": ["Energy", "Space"]
        }"#;
        let rec: PublicationRecord = serde_json::from_str(json).expect("deserialize");
        assert!(rec.notes.is_empty());
        assert!(rec.is_reassigned());
    }

    #[test]
    fn snapshot_serialization() {
        let doc = LoadedDocument {
            file_name: "mir.md".into(),
            fingerprint: DocumentFingerprint::of(b"x"),
            publications: vec![PublicationRecord::new("GAO-24-1", "T", "", "u", None)],
            stats: ParseStats::default(),
        };
        let snap = ReviewSnapshot::new(doc, 1);
        let json = serde_json::to_string(&snap).expect("serialize");
        let parsed: ReviewSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.schema_version, CURRENT_SNAPSHOT_VERSION);
        assert_eq!(parsed.cursor, 1);
        assert_eq!(parsed.document.publications.len(), 1);
    }
}
