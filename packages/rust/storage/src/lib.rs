//! libSQL autosave store (offline mode).
//!
//! The [`Storage`] struct wraps a local libSQL database holding the latest
//! review snapshot per document fingerprint, so a crashed or closed review
//! can be resumed, plus a log of exports written from each review.
//!
//! **Access rules:**
//! - TUI: read-write via [`Storage::open`], saves after every review action
//! - CLI inspection commands: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use serde::Serialize;
use uuid::Uuid;

use mirreview_shared::{DocumentFingerprint, Result, ReviewError, ReviewSnapshot};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// One row of the autosave listing.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub fingerprint: DocumentFingerprint,
    pub file_name: String,
    pub cursor: usize,
    pub total: usize,
    pub saved_at: DateTime<Utc>,
}

/// One export written from a review.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord {
    pub id: String,
    pub kind: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

fn storage_err(e: impl std::fmt::Display) -> ReviewError {
    ReviewError::Storage(e.to_string())
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ReviewError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReviewError::Storage(format!(
                "no autosave database at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    ReviewError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ReviewError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Autosave operations
    // -----------------------------------------------------------------------

    /// Save `snapshot`, replacing any earlier one for the same document.
    pub async fn save_snapshot(&self, snapshot: &ReviewSnapshot) -> Result<()> {
        self.check_writable()?;
        let json = serde_json::to_string(snapshot)
            .map_err(|e| ReviewError::Storage(format!("failed to encode snapshot: {e}")))?;
        let doc = &snapshot.document;

        self.conn
            .execute(
                "INSERT INTO autosaves (fingerprint, file_name, cursor, total, snapshot_json, saved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(fingerprint) DO UPDATE SET
                   file_name = excluded.file_name,
                   cursor = excluded.cursor,
                   total = excluded.total,
                   snapshot_json = excluded.snapshot_json,
                   saved_at = excluded.saved_at",
                params![
                    doc.fingerprint.0.as_str(),
                    doc.file_name.as_str(),
                    snapshot.cursor as i64,
                    doc.publications.len() as i64,
                    json,
                    snapshot.saved_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(
            fingerprint = %doc.fingerprint.short(),
            cursor = snapshot.cursor,
            "autosaved review"
        );
        Ok(())
    }

    /// Load the snapshot for a document, if one exists.
    pub async fn load_snapshot(
        &self,
        fingerprint: &DocumentFingerprint,
    ) -> Result<Option<ReviewSnapshot>> {
        let mut rows = self
            .conn
            .query(
                "SELECT snapshot_json FROM autosaves WHERE fingerprint = ?1",
                params![fingerprint.0.as_str()],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_snapshot(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Most recently saved snapshot across all documents.
    pub async fn latest_snapshot(&self) -> Result<Option<ReviewSnapshot>> {
        let mut rows = self
            .conn
            .query(
                "SELECT snapshot_json FROM autosaves ORDER BY saved_at DESC LIMIT 1",
                params![],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_snapshot(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// All autosaves, newest first.
    pub async fn list_snapshots(&self) -> Result<Vec<SnapshotSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT fingerprint, file_name, cursor, total, saved_at
                 FROM autosaves ORDER BY saved_at DESC",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(SnapshotSummary {
                fingerprint: DocumentFingerprint(row.get::<String>(0).map_err(storage_err)?),
                file_name: row.get::<String>(1).map_err(storage_err)?,
                cursor: row.get::<i64>(2).map_err(storage_err)? as usize,
                total: row.get::<i64>(3).map_err(storage_err)? as usize,
                saved_at: parse_timestamp(&row.get::<String>(4).map_err(storage_err)?)?,
            });
        }
        Ok(results)
    }

    /// Remove the autosave for a document. Returns whether one existed.
    pub async fn delete_snapshot(&self, fingerprint: &DocumentFingerprint) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute(
                "DELETE FROM autosaves WHERE fingerprint = ?1",
                params![fingerprint.0.as_str()],
            )
            .await
            .map_err(storage_err)?;
        Ok(affected > 0)
    }

    /// Remove every autosave. Returns the number removed.
    pub async fn clear_snapshots(&self) -> Result<u64> {
        self.check_writable()?;
        self.conn
            .execute("DELETE FROM autosaves", params![])
            .await
            .map_err(storage_err)
    }

    // -----------------------------------------------------------------------
    // Export log
    // -----------------------------------------------------------------------

    /// Record that an export of `kind` was written to `path`. Returns its ID.
    pub async fn record_export(
        &self,
        fingerprint: &DocumentFingerprint,
        kind: &str,
        path: &str,
    ) -> Result<String> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO export_log (id, fingerprint, kind, path, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.as_str(), fingerprint.0.as_str(), kind, path, now.as_str()],
            )
            .await
            .map_err(storage_err)?;
        Ok(id)
    }

    /// Exports written for a document, oldest first.
    pub async fn list_exports(
        &self,
        fingerprint: &DocumentFingerprint,
    ) -> Result<Vec<ExportRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, kind, path, created_at FROM export_log
                 WHERE fingerprint = ?1 ORDER BY rowid",
                params![fingerprint.0.as_str()],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(ExportRecord {
                id: row.get::<String>(0).map_err(storage_err)?,
                kind: row.get::<String>(1).map_err(storage_err)?,
                path: row.get::<String>(2).map_err(storage_err)?,
                created_at: parse_timestamp(&row.get::<String>(3).map_err(storage_err)?)?,
            });
        }
        Ok(results)
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ReviewError::Storage(format!("invalid date: {e}")))
}

/// Decode the snapshot JSON column.
fn row_to_snapshot(row: &libsql::Row) -> Result<ReviewSnapshot> {
    let json: String = row.get(0).map_err(storage_err)?;
    serde_json::from_str(&json)
        .map_err(|e| ReviewError::parse(format!("corrupt autosave snapshot: {e}")))
}
