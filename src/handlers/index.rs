use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::ApiResponse;
use crate::AppState;

/// Service descriptor
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: &'static str,
    pub description: String,
}

/// GET /api/v1
pub async fn index(State(state): State<AppState>) -> Json<ApiResponse<ServiceInfo>> {
    Json(ApiResponse::success(ServiceInfo {
        name: state.config.service.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        description: state.config.service.description.clone(),
    }))
}
