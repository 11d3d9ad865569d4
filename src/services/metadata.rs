use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{FileMetadata, NewFileMetadata};

/// Persistent index of uploaded blobs, one row per sanitized filename
#[derive(Clone)]
pub struct MetadataStore {
    db: Database,
}

impl MetadataStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new row, returning its id
    ///
    /// The UNIQUE constraint on filename rejects duplicates; exactly one of
    /// any set of racing inserts for the same name succeeds.
    pub async fn insert(&self, record: &NewFileMetadata, uploaded_at: &str) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO files (filename, original_name, file_path, file_size, mime_type, owner, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.filename)
        .bind(&record.original_name)
        .bind(&record.file_path)
        .bind(record.file_size)
        .bind(&record.mime_type)
        .bind(&record.owner)
        .bind(uploaded_at)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict(format!(
                    "A file named {} already exists",
                    record.filename
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All rows, no ordering contract
    pub async fn list_all(&self) -> Result<Vec<FileMetadata>> {
        let files = sqlx::query_as("SELECT * FROM files")
            .fetch_all(self.db.pool())
            .await?;
        Ok(files)
    }

    /// Substring match on filename, capped at limit rows
    pub async fn search_by_name(&self, pattern: &str, limit: i64) -> Result<Vec<FileMetadata>> {
        let files = sqlx::query_as("SELECT * FROM files WHERE filename LIKE ? LIMIT ?")
            .bind(format!("%{}%", pattern))
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;
        Ok(files)
    }

    /// Delete by filename; removing an absent name affects zero rows and is
    /// not an error at this layer
    pub async fn delete_by_name(&self, filename: &str) -> Result<u64> {
        let done = sqlx::query("DELETE FROM files WHERE filename = ?")
            .bind(filename)
            .execute(self.db.pool())
            .await?;
        Ok(done.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (MetadataStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        db.run_migrations().await.unwrap();
        (MetadataStore::new(db), dir)
    }

    fn record(filename: &str) -> NewFileMetadata {
        NewFileMetadata {
            filename: filename.to_string(),
            original_name: filename.to_string(),
            file_path: format!("uploads/{filename}"),
            file_size: 42,
            mime_type: Some("text/plain".to_string()),
            owner: "system".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids() {
        let (store, _dir) = test_store().await;
        let first = store.insert(&record("a.txt"), "2026-01-01T00:00:00Z").await.unwrap();
        let second = store.insert(&record("b.txt"), "2026-01-01T00:00:00Z").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn duplicate_filename_is_a_conflict() {
        let (store, _dir) = test_store().await;
        store.insert(&record("a.txt"), "2026-01-01T00:00:00Z").await.unwrap();
        let err = store
            .insert(&record("a.txt"), "2026-01-01T00:00:00Z")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn search_matches_substrings() {
        let (store, _dir) = test_store().await;
        store.insert(&record("report_q1.pdf"), "2026-01-01T00:00:00Z").await.unwrap();
        store.insert(&record("report_q2.pdf"), "2026-01-01T00:00:00Z").await.unwrap();
        store.insert(&record("notes.txt"), "2026-01-01T00:00:00Z").await.unwrap();

        let hits = store.search_by_name("report", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        let capped = store.search_by_name("report", 1).await.unwrap();
        assert_eq!(capped.len(), 1);

        assert!(store.search_by_name("missing", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_name_is_idempotent() {
        let (store, _dir) = test_store().await;
        store.insert(&record("a.txt"), "2026-01-01T00:00:00Z").await.unwrap();
        assert_eq!(store.delete_by_name("a.txt").await.unwrap(), 1);
        assert_eq!(store.delete_by_name("a.txt").await.unwrap(), 0);
    }
}
