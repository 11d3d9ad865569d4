use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{DeleteFileResponse, FileListResponse, FileMetadata, ReconcileReport};
use crate::AppState;

/// Upload a file
/// POST /api/v1/files/upload
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileMetadata>>> {
    let mut payload: Option<(String, Option<String>, Bytes)> = None;
    let mut owner: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to process multipart: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| AppError::BadRequest("No file name provided".to_string()))?;
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file field: {e}")))?;
                payload = Some((file_name, content_type, data));
            }
            "owner" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    owner = Some(text);
                }
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        payload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let metadata = state.files.upload(&file_name, data, content_type, owner).await?;
    Ok(Json(ApiResponse::success(metadata)))
}

/// List stored filenames
/// GET /api/v1/files
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FileListResponse>>> {
    let files = state.files.list().await?;
    Ok(Json(ApiResponse::success(FileListResponse { files })))
}

/// Look up one file's metadata by name
/// GET /api/v1/files/:filename
pub async fn search_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ApiResponse<FileMetadata>>> {
    let metadata = state.files.search(&filename).await?;
    Ok(Json(ApiResponse::success(metadata)))
}

/// Delete a file and its metadata
/// DELETE /api/v1/files/:filename
pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ApiResponse<DeleteFileResponse>>> {
    let filename = state.files.delete(&filename).await?;
    Ok(Json(ApiResponse::success(DeleteFileResponse {
        message: "File deleted successfully".to_string(),
        filename,
    })))
}

/// Cross-store consistency sweep
/// GET /api/v1/files/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReconcileReport>>> {
    let report = state.files.reconcile().await?;
    Ok(Json(ApiResponse::success(report)))
}
