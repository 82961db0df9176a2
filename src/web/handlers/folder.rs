//! Folder handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::file::{Folder, FolderKey, FolderScope, FolderUpdate, NewFolder};
use crate::web::dto::{
    ApiResponse, CreateFolderRequest, DeleteFolderQuery, FolderDeleteResponse, FolderQuery,
    UpdateFolderRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Parse a `parent_id` query value into a listing scope.
pub fn parse_parent_scope(raw: &str) -> Result<FolderScope, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("root") || raw.eq_ignore_ascii_case("null") {
        return Ok(FolderScope::Root);
    }
    raw.parse::<i64>()
        .map(FolderScope::Children)
        .map_err(|_| ApiError::bad_request(format!("invalid parent_id: {raw}")))
}

/// GET /api/folders - One folder by `id` or `name`, or a listing.
pub async fn get_folders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FolderQuery>,
) -> Result<Response, ApiError> {
    let hierarchy = state.hierarchy();

    let key = match (query.id, query.name) {
        (Some(id), _) => Some(FolderKey::Id(id)),
        (None, Some(name)) => Some(FolderKey::Name(name)),
        (None, None) => None,
    };
    if let Some(key) = key {
        let folder = hierarchy.get_folder(&key).await?;
        return Ok(Json(ApiResponse::new(folder)).into_response());
    }

    let scope = match query.parent_id.as_deref() {
        Some(raw) => parse_parent_scope(raw)?,
        None => FolderScope::All,
    };
    let folders = hierarchy.list_folders(scope).await?;
    Ok(Json(ApiResponse::new(folders)).into_response())
}

/// GET /api/folders/:id/path - Breadcrumb chain from the root.
pub async fn get_folder_path(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Folder>>>, ApiError> {
    let chain = state.hierarchy().folder_path(folder_id).await?;
    Ok(Json(ApiResponse::new(chain)))
}

/// POST /api/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Folder>>), ApiError> {
    let folder = state
        .hierarchy()
        .create_folder(&NewFolder {
            name: req.name,
            parent_id: req.parent_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(folder))))
}

/// PUT /api/folders - Rename and/or move a folder.
pub async fn update_folder(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateFolderRequest>,
) -> Result<Json<ApiResponse<Folder>>, ApiError> {
    let update = FolderUpdate {
        name: req.name,
        parent_id: req.parent_id,
    };
    let folder = state.hierarchy().rename_or_move(req.id, &update).await?;
    Ok(Json(ApiResponse::new(folder)))
}

/// DELETE /api/folders - Delete a folder by `id` or `name`.
///
/// `force=true` removes the whole subtree and releases its blobs.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteFolderQuery>,
) -> Result<Json<ApiResponse<FolderDeleteResponse>>, ApiError> {
    let key = match (query.id, query.name) {
        (Some(id), _) => FolderKey::Id(id),
        (None, Some(name)) => FolderKey::Name(name),
        (None, None) => {
            return Err(ApiError::bad_request(
                "You must specify either an id or a name",
            ))
        }
    };

    let summary = state.hierarchy().delete_folder(&key, query.force).await?;

    for stored_name in &summary.stored_names {
        if let Err(e) = state.storage.delete(stored_name).await {
            tracing::warn!(stored_name = %stored_name, error = %e, "Failed to release blob");
        }
    }

    Ok(Json(ApiResponse::new(FolderDeleteResponse::from(&summary))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parent_scope() {
        assert_eq!(parse_parent_scope("root").unwrap(), FolderScope::Root);
        assert_eq!(parse_parent_scope("").unwrap(), FolderScope::Root);
        assert_eq!(parse_parent_scope("12").unwrap(), FolderScope::Children(12));
        assert!(parse_parent_scope("twelve").is_err());
    }
}
