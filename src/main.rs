mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::{AuditLog, FileService, MetadataStore};
use crate::storage::BlobStore;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub files: FileService,
    pub audit: AuditLog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filevault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting filevault...");

    // Load configuration
    let config = Config::load()?;
    let config = Arc::new(config);
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    // Wire up the stores and the orchestration service
    let audit = AuditLog::new(db.clone());
    let files = FileService::new(
        MetadataStore::new(db.clone()),
        BlobStore::new(&config.storage.upload_path),
        audit.clone(),
        config.service.default_owner.clone(),
    );

    let state = AppState {
        config: config.clone(),
        files,
        audit,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/", get(handlers::index::index))
        .route("/files", get(handlers::file::list_files))
        .route(
            "/files/upload",
            post(handlers::file::upload_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/files/reconcile", get(handlers::file::reconcile))
        .route(
            "/files/:filename",
            get(handlers::file::search_file).delete(handlers::file::delete_file),
        )
        .route(
            "/logs",
            get(handlers::logs::list_logs).delete(handlers::logs::clear_logs),
        )
        .route("/logs/:id", delete(handlers::logs::delete_log));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
