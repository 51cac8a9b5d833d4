//! SQL migration definitions for the autosave database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: autosaves, export_log",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One autosave per document fingerprint; later saves replace earlier ones
CREATE TABLE IF NOT EXISTS autosaves (
    fingerprint   TEXT PRIMARY KEY,
    file_name     TEXT NOT NULL,
    cursor        INTEGER NOT NULL,
    total         INTEGER NOT NULL,
    snapshot_json TEXT NOT NULL,
    saved_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_autosaves_saved_at ON autosaves(saved_at);

-- Exports written from a review session
CREATE TABLE IF NOT EXISTS export_log (
    id          TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL,
    kind        TEXT NOT NULL,
    path        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_export_log_fingerprint ON export_log(fingerprint);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
