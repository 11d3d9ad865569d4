use serde::Serialize;
use sqlx::FromRow;

/// Metadata row describing one stored blob
///
/// `filename` is the sanitized, unique key shared with the blob store;
/// `original_name` keeps the caller-supplied name for display only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileMetadata {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub uploaded_at: String,
    pub owner: String,
}

/// Insert payload for a new metadata row
#[derive(Debug, Clone)]
pub struct NewFileMetadata {
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub owner: String,
}

/// File list response
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

/// Delete confirmation
#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub message: String,
    pub filename: String,
}

/// Result of a cross-store consistency sweep
#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    /// Filenames with a metadata row but no blob
    pub missing_blobs: Vec<String>,
    /// Filenames with a blob but no metadata row
    pub missing_rows: Vec<String>,
}
