//! Router configuration for the HTTP layer.

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::dto::{ApiResponse, HealthResponse};
use super::handlers::{
    create_folder, delete_file, delete_file_by_name, delete_folder, download_file, get_file,
    get_file_tree, get_folder_path, get_folders, list_files, update_folder, upload_file,
    AppState,
};
use super::middleware::create_cors_layer;

/// Headroom for multipart framing on top of the file size limit.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit =
        usize::try_from(app_state.max_upload_size.saturating_add(MULTIPART_OVERHEAD))
            .unwrap_or(usize::MAX);

    let folder_routes = Router::new()
        .route(
            "/folders",
            get(get_folders)
                .post(create_folder)
                .put(update_folder)
                .delete(delete_folder),
        )
        .route("/folders/:id/path", get(get_folder_path));

    let file_routes = Router::new()
        .route(
            "/files",
            get(list_files).post(upload_file).delete(delete_file_by_name),
        )
        .route("/files/tree", get(get_file_tree))
        .route("/files/:id", get(get_file).delete(delete_file))
        .route("/files/:id/download", get(download_file));

    let api_routes = Router::new()
        .merge(folder_routes)
        .merge(file_routes)
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
}

/// Router with the bare liveness probe.
pub fn create_health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(|| async { "OK" }))
}

/// Health check handler.
async fn health_check() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::new(HealthResponse::default()))
}
