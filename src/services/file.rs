use std::collections::HashSet;

use bytes::Bytes;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{FileMetadata, LogAction, LogKind, NewFileMetadata, ReconcileReport};
use crate::services::{AuditLog, MetadataStore};
use crate::storage::BlobStore;

/// Reduce a caller-supplied name to a safe storage key: the final path
/// segment, with whitespace runs collapsed to a single underscore.
///
/// Idempotent. Names with no usable segment (empty, `.`, `..`, trailing
/// separators only) reduce to the empty string, which callers reject.
pub fn sanitize_filename(raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    let base = trimmed.rsplit('/').next().unwrap_or("");

    if base == "." || base == ".." {
        return String::new();
    }

    let mut out = String::with_capacity(base.len());
    let mut in_whitespace = false;
    for c in base.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Orchestrates the blob store and the metadata store so that both move
/// together: a row exists exactly when its blob does.
///
/// Ordering rule: the row is written before the blob on upload and the blob
/// is removed before the row on delete. A crash mid-operation therefore
/// leaves an orphan row, never an orphan blob; rows are cheap to enumerate
/// and sweep (see [`FileService::reconcile`]).
#[derive(Clone)]
pub struct FileService {
    meta: MetadataStore,
    blobs: BlobStore,
    audit: AuditLog,
    default_owner: String,
}

impl FileService {
    pub fn new(meta: MetadataStore, blobs: BlobStore, audit: AuditLog, default_owner: String) -> Self {
        Self {
            meta,
            blobs,
            audit,
            default_owner,
        }
    }

    /// Store a file: metadata row first, then the blob
    ///
    /// The row gates existence: a duplicate name fails on the insert and
    /// never touches the filesystem. If the blob write fails after the
    /// insert, the row is deleted again to keep the stores coupled.
    pub async fn upload(
        &self,
        raw_name: &str,
        data: Bytes,
        mime_type: Option<String>,
        owner: Option<String>,
    ) -> Result<FileMetadata> {
        let filename = sanitize_filename(raw_name);
        if filename.is_empty() {
            self.audit
                .record(
                    &format!("Rejected upload with unusable filename: {raw_name:?}"),
                    LogKind::Error,
                    LogAction::Upload,
                    &self.default_owner,
                )
                .await;
            return Err(AppError::BadRequest(
                "Invalid or empty filename".to_string(),
            ));
        }

        let owner = owner.unwrap_or_else(|| self.default_owner.clone());
        let record = NewFileMetadata {
            filename: filename.clone(),
            original_name: raw_name.to_string(),
            file_path: self.blobs.blob_path(&filename).display().to_string(),
            file_size: data.len() as i64,
            mime_type,
            owner,
        };

        let uploaded_at = Utc::now().to_rfc3339();
        let id = match self.meta.insert(&record, &uploaded_at).await {
            Ok(id) => id,
            Err(e) => {
                self.audit
                    .record(
                        &format!("Upload of {filename} rejected: {e}"),
                        LogKind::Error,
                        LogAction::Upload,
                        &record.owner,
                    )
                    .await;
                return Err(e);
            }
        };

        if let Err(put_err) = self.blobs.put(&filename, &data).await {
            // The row is in but the blob is not: undo the insert so a
            // later read cannot observe the gap.
            match self.meta.delete_by_name(&filename).await {
                Ok(_) => {
                    self.audit
                        .record(
                            &format!("Upload of {filename} failed, metadata rolled back: {put_err}"),
                            LogKind::Error,
                            LogAction::Upload,
                            &record.owner,
                        )
                        .await;
                }
                Err(rollback_err) => {
                    // Both halves failed: the orphan row stays behind until
                    // a reconcile pass picks it up.
                    tracing::error!(
                        filename = %filename,
                        %put_err,
                        %rollback_err,
                        "blob write and metadata rollback both failed; orphan row needs reconciliation"
                    );
                    self.audit
                        .record(
                            &format!(
                                "Upload of {filename} failed and rollback failed, metadata row is orphaned: {rollback_err}"
                            ),
                            LogKind::Error,
                            LogAction::Upload,
                            &record.owner,
                        )
                        .await;
                }
            }
            return Err(AppError::Storage(format!(
                "Failed to store {filename}: {put_err}"
            )));
        }

        let metadata = FileMetadata {
            id,
            filename: record.filename,
            original_name: record.original_name,
            file_path: record.file_path,
            file_size: record.file_size,
            mime_type: record.mime_type,
            uploaded_at,
            owner: record.owner,
        };

        tracing::info!(filename = %metadata.filename, size = metadata.file_size, "file uploaded");
        self.audit
            .record(
                &format!("File uploaded successfully: {}", metadata.filename),
                LogKind::Success,
                LogAction::Upload,
                &metadata.owner,
            )
            .await;
        Ok(metadata)
    }

    /// Stored filenames, straight from the metadata index
    pub async fn list(&self) -> Result<Vec<String>> {
        let rows = match self.meta.list_all().await {
            Ok(rows) => rows,
            Err(e) => {
                self.audit
                    .record(
                        &format!("Failed to list files: {e}"),
                        LogKind::Error,
                        LogAction::List,
                        &self.default_owner,
                    )
                    .await;
                return Err(e);
            }
        };

        let names = rows.into_iter().map(|f| f.filename).collect();
        self.audit
            .record(
                "Listed files successfully",
                LogKind::Success,
                LogAction::List,
                &self.default_owner,
            )
            .await;
        Ok(names)
    }

    /// Look up one file's metadata by (sanitized) name
    pub async fn search(&self, raw_name: &str) -> Result<FileMetadata> {
        let filename = sanitize_filename(raw_name);
        if filename.is_empty() {
            return Err(AppError::BadRequest(
                "Invalid or empty filename".to_string(),
            ));
        }

        let matches = match self.meta.search_by_name(&filename, 1).await {
            Ok(matches) => matches,
            Err(e) => {
                self.audit
                    .record(
                        &format!("Failed to search for {filename}: {e}"),
                        LogKind::Error,
                        LogAction::Search,
                        &self.default_owner,
                    )
                    .await;
                return Err(e);
            }
        };

        match matches.into_iter().next() {
            Some(found) => {
                self.audit
                    .record(
                        &format!("File found: {}", found.filename),
                        LogKind::Success,
                        LogAction::Search,
                        &self.default_owner,
                    )
                    .await;
                Ok(found)
            }
            None => {
                // An expected outcome, not a failure
                self.audit
                    .record(
                        &format!("File not found: {filename}"),
                        LogKind::Info,
                        LogAction::Search,
                        &self.default_owner,
                    )
                    .await;
                Err(AppError::NotFound(format!("No file matching {filename}")))
            }
        }
    }

    /// Remove a file: blob first, then its metadata row
    ///
    /// The blob's absence gates row removal. A failed blob delete leaves
    /// the row untouched; it is the only remaining record of a blob that
    /// may still exist.
    pub async fn delete(&self, raw_name: &str) -> Result<String> {
        let filename = sanitize_filename(raw_name);
        if filename.is_empty() {
            return Err(AppError::BadRequest(
                "Invalid or empty filename".to_string(),
            ));
        }

        if !self.blobs.exists(&filename).await {
            self.audit
                .record(
                    &format!("File not found: {filename}"),
                    LogKind::Info,
                    LogAction::Delete,
                    &self.default_owner,
                )
                .await;
            return Err(AppError::NotFound(format!("No file named {filename}")));
        }

        if let Err(e) = self.blobs.delete(&filename).await {
            // A NotFound here means the blob vanished between the exists
            // check and the delete; still an expected outcome, not a failure.
            let kind = match &e {
                AppError::NotFound(_) => LogKind::Info,
                _ => LogKind::Error,
            };
            self.audit
                .record(
                    &format!("Failed to delete {filename}: {e}"),
                    kind,
                    LogAction::Delete,
                    &self.default_owner,
                )
                .await;
            return Err(e);
        }

        // Zero rows affected means the row was already gone; the blob
        // delete just healed an orphan, so that still counts as success.
        if let Err(e) = self.meta.delete_by_name(&filename).await {
            tracing::error!(
                filename = %filename,
                %e,
                "blob removed but its metadata row remains; orphan row needs reconciliation"
            );
            self.audit
                .record(
                    &format!("Blob for {filename} deleted but its metadata row remains: {e}"),
                    LogKind::Error,
                    LogAction::Delete,
                    &self.default_owner,
                )
                .await;
            return Err(AppError::Storage(format!(
                "Failed to delete metadata for {filename}: {e}"
            )));
        }

        tracing::info!(filename = %filename, "file deleted");
        self.audit
            .record(
                &format!("File deleted successfully: {filename}"),
                LogKind::Success,
                LogAction::Delete,
                &self.default_owner,
            )
            .await;
        Ok(filename)
    }

    /// Cross-store consistency sweep: rows whose blob is missing and blobs
    /// no row references
    ///
    /// Bounds the lifetime of orphans left behind by a crash or a failed
    /// compensation; single requests stay correct without it.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let rows = self.meta.list_all().await?;

        let mut missing_blobs = Vec::new();
        for row in &rows {
            if !self.blobs.exists(&row.filename).await {
                missing_blobs.push(row.filename.clone());
            }
        }
        missing_blobs.sort();

        let known: HashSet<&str> = rows.iter().map(|r| r.filename.as_str()).collect();
        let mut missing_rows: Vec<String> = self
            .blobs
            .list_names()
            .await?
            .into_iter()
            .filter(|name| !known.contains(name.as_str()))
            .collect();
        missing_rows.sort();

        if !missing_blobs.is_empty() || !missing_rows.is_empty() {
            tracing::warn!(
                orphan_rows = missing_blobs.len(),
                orphan_blobs = missing_rows.len(),
                "stores are out of sync"
            );
        }

        Ok(ReconcileReport {
            missing_blobs,
            missing_rows,
        })
    }
}
