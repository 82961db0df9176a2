//! File handlers.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::{path, FileFilter, FileKey, FileRecord, NewFile, TreeNode};
use crate::web::dto::{ApiResponse, DeleteFileQuery, FileQuery};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Build a Content-Disposition value that survives any file name.
///
/// Control characters are dropped and quotes escaped in the plain `filename`;
/// non-ASCII names also get an RFC 5987 `filename*`.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("attachment; filename=\"{filename}\"");
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

/// Turn the listing query into a filter.
pub fn file_filter(query: FileQuery) -> Result<FileFilter, ApiError> {
    let mut filter = FileFilter::new();

    match query.folder_id.as_deref().map(str::trim) {
        None | Some("") => {}
        Some(raw) if raw.eq_ignore_ascii_case("root") => filter = filter.at_root(),
        Some(raw) => {
            let folder_id = raw
                .parse::<i64>()
                .map_err(|_| ApiError::bad_request(format!("invalid folder_id: {raw}")))?;
            filter = filter.in_folder(folder_id);
        }
    }
    if let Some(owner_id) = query.owner_id {
        filter = filter.owned_by(owner_id);
    }
    if let Some(prefix) = query.prefix.filter(|p| !p.is_empty()) {
        filter = filter.with_prefix(prefix);
    }

    Ok(filter)
}

/// GET /api/files - List file records.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FileQuery>,
) -> Result<Json<ApiResponse<Vec<FileRecord>>>, ApiError> {
    let filter = file_filter(query)?;
    let files = state.hierarchy().list_files(&filter).await?;
    Ok(Json(ApiResponse::new(files)))
}

/// GET /api/files/tree - Tree view built from virtual paths.
pub async fn get_file_tree(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FileQuery>,
) -> Result<Json<ApiResponse<TreeNode>>, ApiError> {
    let filter = file_filter(query)?;
    let tree = state.hierarchy().file_tree(&filter).await?;
    Ok(Json(ApiResponse::new(tree)))
}

/// GET /api/files/:id - File metadata.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<FileRecord>>, ApiError> {
    let file = state.hierarchy().get_file(&FileKey::Id(file_id)).await?;
    Ok(Json(ApiResponse::new(file)))
}

/// GET /api/files/:id/download - File contents.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Response<Body>, ApiError> {
    let file = state.hierarchy().get_file(&FileKey::Id(file_id)).await?;

    let content = state.storage.load(&file.stored_name).await.map_err(|e| {
        tracing::error!(file_id, error = %e, "Failed to load blob");
        ApiError::internal("Failed to load file")
    })?;

    let filename = path::file_name(&file.original_name).unwrap_or(&file.original_name);
    Response::builder()
        .header(header::CONTENT_TYPE, &file.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(filename),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// POST /api/files - Upload a file.
///
/// Multipart fields: `file` (required), `folder_id`, `owner_id`, and `path`
/// (virtual path, defaults to the client file name).
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileRecord>>), ApiError> {
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut folder_id: Option<i64> = None;
    let mut owner_id: Option<i64> = None;
    let mut virtual_path: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(str::to_string);
                content_type = field.content_type().map(str::to_string);
                content = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            "folder_id" => {
                folder_id = parse_optional_id("folder_id", &field.text().await.map_err(multipart_error)?)?;
            }
            "owner_id" => {
                owner_id = parse_optional_id("owner_id", &field.text().await.map_err(multipart_error)?)?;
            }
            "path" => {
                let text = field.text().await.map_err(multipart_error)?;
                virtual_path = Some(text).filter(|p| !p.trim().is_empty());
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let original_name = virtual_path
        .or(filename)
        .ok_or_else(|| ApiError::bad_request("No file name provided"))?;

    if content.len() as u64 > state.max_upload_size {
        let max_mb = state.max_upload_size / 1024 / 1024;
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {max_mb}MB)"
        )));
    }

    let mime_type = content_type
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(&original_name)
                .first_or_octet_stream()
                .to_string()
        });

    let stored_name = state.storage.save(&content, &original_name).await?;

    let mut new_file = NewFile::new(
        original_name,
        stored_name.clone(),
        content.len() as i64,
        mime_type,
    );
    new_file.folder_id = folder_id;
    new_file.owner_id = owner_id;

    let file = match state.hierarchy().create_file(&new_file).await {
        Ok(file) => file,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&stored_name).await {
                tracing::warn!(stored_name = %stored_name, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::new(file))))
}

/// DELETE /api/files/:id - Delete a file by ID.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<FileRecord>>, ApiError> {
    remove_file(&state, FileKey::Id(file_id)).await
}

/// DELETE /api/files?name= - Delete a file by name.
pub async fn delete_file_by_name(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteFileQuery>,
) -> Result<Json<ApiResponse<FileRecord>>, ApiError> {
    let name = query
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("You must specify a file name"))?;
    remove_file(&state, FileKey::Name(name)).await
}

async fn remove_file(
    state: &AppState,
    key: FileKey,
) -> Result<Json<ApiResponse<FileRecord>>, ApiError> {
    let file = state.hierarchy().delete_file(&key).await?;

    if let Err(e) = state.storage.delete(&file.stored_name).await {
        tracing::warn!(file_id = file.id, error = %e, "Failed to release blob");
    }

    Ok(Json(ApiResponse::new(file)))
}

fn parse_optional_id(field: &str, raw: &str) -> Result<Option<i64>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("invalid {field}: {raw}")))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("Upload exceeds the size limit");
    }
    tracing::debug!("Failed to read multipart data: {}", e);
    ApiError::bad_request("Invalid multipart data")
}
