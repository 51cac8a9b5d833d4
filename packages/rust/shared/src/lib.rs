//! Shared types, error model, and configuration for mirreview.
//!
//! This crate is the foundation depended on by all other mirreview crates.
//! It provides:
//! - [`ReviewError`], the unified error type
//! - Domain types ([`PublicationRecord`], [`LoadedDocument`], [`ReviewSnapshot`])
//! - The topic taxonomy ([`CANONICAL_TOPICS`], [`normalize_topic`])
//! - Configuration ([`AppConfig`], [`ParserOptions`], config loading)

pub mod config;
pub mod error;
pub mod topics;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConverterConfig, ConverterOptions, DefaultsConfig, HeaderStyle, MarkdownOrder,
    ParserConfig, ParserOptions, StorageConfig, TrackChanges, autosave_db_path, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{Result, ReviewError};
pub use topics::{CANONICAL_TOPICS, canonical_index, is_canonical, normalize_topic};
pub use types::{
    CURRENT_SNAPSHOT_VERSION, DocumentFingerprint, LoadedDocument, ParseStats,
    PublicationRecord, ReviewSnapshot,
};
