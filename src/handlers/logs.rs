use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{ClearLogsResponse, LogEntry, LogsQuery};
use crate::AppState;

/// List audit entries, newest first
/// GET /api/v1/logs?limit=N
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ApiResponse<Vec<LogEntry>>>> {
    if query.limit <= 0 {
        return Err(AppError::BadRequest("limit must be positive".to_string()));
    }
    let entries = state.audit.entries(query.limit).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Remove one audit entry
/// DELETE /api/v1/logs/:id
pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.audit.delete(id).await?;
    Ok(Json(ApiResponse::<()>::success_message("Log entry deleted")))
}

/// Clear the audit trail
/// DELETE /api/v1/logs
pub async fn clear_logs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClearLogsResponse>>> {
    let rows_affected = state.audit.clear().await?;
    Ok(Json(ApiResponse::success(ClearLogsResponse { rows_affected })))
}
