//! CSV and topic-grouped markdown exports.
//!
//! Both exports read a record's `assigned_topics`; the CSV also carries the
//! original topics for comparison.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use mirreview_shared::{
    CANONICAL_TOPICS, MarkdownOrder, PublicationRecord, Result, ReviewError, canonical_index,
};

use crate::session::ReviewSession;

/// Separator for topic lists inside one CSV cell.
pub const TOPIC_SEPARATOR: &str = " | ";

/// File name of the markdown export.
pub const MARKDOWN_FILE_NAME: &str = "month_review_updated.md";

/// File name of the CSV export once every record has been reviewed.
pub const COMPLETE_CSV_FILE_NAME: &str = "publications_reviewed.csv";

const MARKDOWN_HEADING: &str = "# GAO Month in Review - Updated Topic Assignments\n";

/// Export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Csv,
    Markdown,
}

impl ExportKind {
    /// Label stored in the export log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Markdown => "markdown",
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    identifier: &'a str,
    title: &'a str,
    date: &'a str,
    original_topics: String,
    assigned_topics: String,
    notes: &'a str,
}

/// Flat table, one row per record, in record order.
pub fn to_csv(records: &[PublicationRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(CsvRow {
                identifier: &record.identifier,
                title: &record.title,
                date: &record.date,
                original_topics: record.original_topics.join(TOPIC_SEPARATOR),
                assigned_topics: record.assigned_topics.join(TOPIC_SEPARATOR),
                notes: &record.notes,
            })
            .map_err(|e| ReviewError::Export(format!("failed to write CSV row: {e}")))?;
    }
    if records.is_empty() {
        writer
            .write_record([
                "identifier",
                "title",
                "date",
                "original_topics",
                "assigned_topics",
                "notes",
            ])
            .map_err(|e| ReviewError::Export(format!("failed to write CSV header: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReviewError::Export(format!("failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ReviewError::Export(format!("CSV is not UTF-8: {e}")))
}

/// Records grouped under each canonical topic they are assigned to, topics in
/// taxonomy order. Topics without records and non-canonical labels are left
/// out.
pub fn group_by_topic(
    records: &[PublicationRecord],
    order: MarkdownOrder,
) -> Vec<(&'static str, Vec<&PublicationRecord>)> {
    let mut buckets: Vec<Vec<&PublicationRecord>> = vec![Vec::new(); CANONICAL_TOPICS.len()];
    for record in records {
        for topic in &record.assigned_topics {
            if let Some(idx) = canonical_index(topic) {
                if !buckets[idx].iter().any(|r| r.identifier == record.identifier) {
                    buckets[idx].push(record);
                }
            }
        }
    }

    CANONICAL_TOPICS
        .iter()
        .zip(buckets)
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(topic, mut bucket)| {
            match order {
                MarkdownOrder::Identifier => {
                    bucket.sort_by(|a, b| a.identifier.cmp(&b.identifier))
                }
                MarkdownOrder::Title => bucket.sort_by(|a, b| {
                    a.title
                        .to_lowercase()
                        .cmp(&b.title.to_lowercase())
                        .then_with(|| a.identifier.cmp(&b.identifier))
                }),
            }
            (*topic, bucket)
        })
        .collect()
}

/// Updated review document, one section per canonical topic.
pub fn to_markdown(records: &[PublicationRecord], order: MarkdownOrder) -> String {
    let mut lines = vec![MARKDOWN_HEADING.to_string()];
    for (topic, bucket) in group_by_topic(records, order) {
        lines.push(format!("\n## {topic}\n"));
        for record in bucket {
            lines.push(format!("**{}**\\", record.title));
            lines.push(format!("{}, {}", record.identifier, record.date));
            lines.push(format!("<{}>\n", record.source_url));
        }
    }
    lines.join("\n")
}

/// Default file name for a CSV export of `session`.
pub fn csv_file_name(session: &ReviewSession) -> String {
    if session.is_complete() {
        COMPLETE_CSV_FILE_NAME.to_string()
    } else {
        let progress = session.progress();
        format!("progress_{}_of_{}.csv", progress.position, progress.total)
    }
}

/// Render `kind` for `session` and write it under `dir`. Returns the path.
#[instrument(skip_all, fields(kind = kind.as_str(), dir = %dir.display()))]
pub fn write_export(
    session: &ReviewSession,
    kind: ExportKind,
    order: MarkdownOrder,
    dir: &Path,
) -> Result<PathBuf> {
    if !session.is_loaded() {
        return Err(ReviewError::validation("no document loaded"));
    }

    let (file_name, contents) = match kind {
        ExportKind::Csv => (csv_file_name(session), to_csv(session.publications())?),
        ExportKind::Markdown => (
            MARKDOWN_FILE_NAME.to_string(),
            to_markdown(session.publications(), order),
        ),
    };

    std::fs::create_dir_all(dir).map_err(|e| ReviewError::io(dir, e))?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents).map_err(|e| ReviewError::io(&path, e))?;

    info!(path = %path.display(), "export written");
    Ok(path)
}
