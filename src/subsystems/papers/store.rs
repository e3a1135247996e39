//! `papers` SQLite store, one row per `(level, subject, year)`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::AppError;
use super::PaperStore;
use super::types::{Level, NewPaper, PaperKey, PaperRecord};

/// Schema version stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

/// SQLite-backed [`PaperStore`]. Each operation opens its own connection,
/// so the handle is cheap to clone and share across threads.
#[derive(Debug, Clone)]
pub struct SqlitePaperStore {
    db_path: PathBuf,
}

impl SqlitePaperStore {
    /// Open (creating if needed) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Store(format!("papers: cannot create {}: {e}", parent.display()))
            })?;
        }
        let store = Self { db_path: db_path.to_path_buf() };
        store.init_db()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of stored papers.
    pub fn count(&self) -> Result<u64, AppError> {
        let conn = self.open_conn()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM papers", [], |row| row.get(0))
            .map_err(|e| AppError::Store(format!("papers: count: {e}")))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    fn init_db(&self) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .map_err(|e| AppError::Store(format!("papers: read schema version: {e}")))?;

        if version == 0 {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS papers (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    level TEXT NOT NULL,
                    subject TEXT NOT NULL,
                    year TEXT NOT NULL,
                    file_id TEXT NOT NULL,
                    file_name TEXT,
                    uploaded_by TEXT NOT NULL,
                    uploaded_at TEXT NOT NULL,
                    UNIQUE(level, subject, year)
                );

                PRAGMA user_version = 1;
                ",
            )
            .map_err(|e| AppError::Store(format!("papers: initialize schema: {e}")))?;
            return Ok(());
        }

        if version != SCHEMA_VERSION {
            return Err(AppError::Store(format!(
                "papers: unsupported schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }

        Ok(())
    }

    fn open_conn(&self) -> Result<Connection, AppError> {
        let conn = Connection::open(&self.db_path).map_err(|e| {
            AppError::Store(format!("papers: open {}: {e}", self.db_path.display()))
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| AppError::Store(format!("papers: set journal_mode WAL: {e}")))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| AppError::Store(format!("papers: set busy_timeout: {e}")))?;

        Ok(conn)
    }

    fn query_labels(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
        what: &str,
    ) -> Result<Vec<String>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| AppError::Store(format!("papers: prepare {what}: {e}")))?;
        let rows = stmt
            .query_map(args, |row| row.get::<_, String>(0))
            .map_err(|e| AppError::Store(format!("papers: query {what}: {e}")))?;

        let mut labels = Vec::new();
        for row in rows {
            labels.push(row.map_err(|e| AppError::Store(format!("papers: map {what} row: {e}")))?);
        }
        Ok(labels)
    }
}

impl PaperStore for SqlitePaperStore {
    fn list_subjects(&self, level: Level) -> Result<Vec<String>, AppError> {
        self.query_labels(
            "SELECT DISTINCT subject FROM papers WHERE level = ?1 ORDER BY subject",
            &[&level.as_str()],
            "list_subjects",
        )
    }

    fn list_years(&self, level: Level, subject: &str) -> Result<Vec<String>, AppError> {
        self.query_labels(
            "SELECT DISTINCT year FROM papers WHERE level = ?1 AND subject = ?2 ORDER BY year DESC",
            &[&level.as_str(), &subject],
            "list_years",
        )
    }

    fn find(&self, key: &PaperKey) -> Result<Option<PaperRecord>, AppError> {
        let conn = self.open_conn()?;
        conn.query_row(
            "SELECT file_id, file_name, uploaded_by, uploaded_at FROM papers
             WHERE level = ?1 AND subject = ?2 AND year = ?3",
            params![key.level.as_str(), key.subject, key.year],
            |row| {
                Ok(PaperRecord {
                    key: key.clone(),
                    document_reference: row.get(0)?,
                    display_name: row.get(1)?,
                    uploaded_by: row.get(2)?,
                    uploaded_at: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| AppError::Store(format!("papers: find {key}: {e}")))
    }

    fn upsert(&self, paper: NewPaper) -> Result<PaperRecord, AppError> {
        let uploaded_at = now_iso8601();
        let conn = self.open_conn()?;
        conn.execute(
            "INSERT INTO papers (level, subject, year, file_id, file_name, uploaded_by, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(level, subject, year) DO UPDATE SET
                 file_id = excluded.file_id,
                 file_name = excluded.file_name,
                 uploaded_by = excluded.uploaded_by,
                 uploaded_at = excluded.uploaded_at",
            params![
                paper.key.level.as_str(),
                paper.key.subject,
                paper.key.year,
                paper.document_reference,
                paper.display_name,
                paper.uploaded_by,
                uploaded_at,
            ],
        )
        .map_err(|e| AppError::Store(format!("papers: upsert {}: {e}", paper.key)))?;

        debug!(key = %paper.key, uploaded_by = %paper.uploaded_by, "paper stored");

        Ok(PaperRecord {
            key: paper.key,
            document_reference: paper.document_reference,
            display_name: paper.display_name,
            uploaded_by: paper.uploaded_by,
            uploaded_at,
        })
    }

    fn delete(&self, key: &PaperKey) -> Result<bool, AppError> {
        let conn = self.open_conn()?;
        let removed = conn
            .execute(
                "DELETE FROM papers WHERE level = ?1 AND subject = ?2 AND year = ?3",
                params![key.level.as_str(), key.subject, key.year],
            )
            .map_err(|e| AppError::Store(format!("papers: delete {key}: {e}")))?;
        Ok(removed > 0)
    }
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
