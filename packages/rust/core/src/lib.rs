//! Review workflow for mirreview.
//!
//! This crate ties the markdown parser to the rest of the tool: document
//! ingest (with Word conversion), the review session state machine, and
//! the CSV and markdown exports.

pub mod convert;
pub mod export;
pub mod ingest;
pub mod session;

pub use convert::{DocumentConverter, PandocConverter};
pub use export::{ExportKind, csv_file_name, group_by_topic, to_csv, to_markdown, write_export};
pub use ingest::{DocumentKind, Ingestor, ProgressReporter, SilentProgress};
pub use session::{ChangeKind, Progress, ReviewAction, ReviewEdit, ReviewSession, TopicChange};
