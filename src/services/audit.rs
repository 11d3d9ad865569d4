use crate::db::Database;
use crate::error::Result;
use crate::models::{LogAction, LogEntry, LogKind};

/// Append-only audit trail
///
/// `record` runs after the primary operation's outcome is already decided,
/// so its failures are traced and dropped rather than propagated.
#[derive(Clone)]
pub struct AuditLog {
    db: Database,
}

impl AuditLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append an entry, best effort
    pub async fn record(&self, message: &str, kind: LogKind, action: LogAction, actor: &str) {
        let result = sqlx::query(
            "INSERT INTO logs (message, type, action, client_name) VALUES (?, ?, ?, ?)",
        )
        .bind(message)
        .bind(kind.as_str())
        .bind(action.as_str())
        .bind(actor)
        .execute(self.db.pool())
        .await;

        if let Err(e) = result {
            tracing::error!("Failed to append audit entry: {e}");
        }
    }

    /// Most recent entries first
    pub async fn entries(&self, limit: i64) -> Result<Vec<LogEntry>> {
        let entries =
            sqlx::query_as("SELECT * FROM logs ORDER BY timestamp DESC, id DESC LIMIT ?")
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?;
        Ok(entries)
    }

    /// Remove one entry; unknown ids are a no-op
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM logs WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Remove every entry, returning how many were dropped
    pub async fn clear(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM logs").execute(self.db.pool()).await?;
        Ok(done.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_log() -> (AuditLog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        db.run_migrations().await.unwrap();
        (AuditLog::new(db), dir)
    }

    #[tokio::test]
    async fn record_then_list() {
        let (audit, _dir) = test_log().await;
        audit
            .record("File uploaded successfully: a.txt", LogKind::Success, LogAction::Upload, "system")
            .await;
        audit
            .record("File not found: b.txt", LogKind::Info, LogAction::Search, "system")
            .await;

        let entries = audit.entries(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        // Newest first
        assert_eq!(entries[0].action, "search");
        assert_eq!(entries[0].kind, "info");
        assert_eq!(entries[1].kind, "success");
        assert_eq!(entries[1].client_name, "system");
    }

    #[tokio::test]
    async fn entries_respects_limit() {
        let (audit, _dir) = test_log().await;
        for i in 0..5 {
            audit
                .record(&format!("entry {i}"), LogKind::Info, LogAction::List, "system")
                .await;
        }
        assert_eq!(audit.entries(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_a_noop() {
        let (audit, _dir) = test_log().await;
        audit.delete(12345).await.unwrap();
    }

    #[tokio::test]
    async fn clear_reports_rows_dropped() {
        let (audit, _dir) = test_log().await;
        audit.record("one", LogKind::Info, LogAction::List, "system").await;
        audit.record("two", LogKind::Info, LogAction::List, "system").await;
        assert_eq!(audit.clear().await.unwrap(), 2);
        assert!(audit.entries(10).await.unwrap().is_empty());
    }
}
