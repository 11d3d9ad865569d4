use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Audit log entry
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub message: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub action: String,
    pub client_name: String,
}

/// Severity recorded with an audit entry
#[derive(Debug, Clone, Copy)]
pub enum LogKind {
    Info,
    Error,
    Success,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Error => "error",
            LogKind::Success => "success",
        }
    }
}

/// Operation an audit entry belongs to
#[derive(Debug, Clone, Copy)]
pub enum LogAction {
    Upload,
    List,
    Search,
    Delete,
}

impl LogAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LogAction::Upload => "upload",
            LogAction::List => "list",
            LogAction::Search => "search",
            LogAction::Delete => "delete",
        }
    }
}

/// Audit listing query parameters
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: i64,
}

/// Clear-all confirmation
#[derive(Debug, Serialize)]
pub struct ClearLogsResponse {
    pub rows_affected: u64,
}
