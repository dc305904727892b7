use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extract::AdminUser;
use crate::services::storage::{object_name, MAX_UPLOAD_BYTES};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

/// Multipart form for the OpenAPI document.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Upload one image to object storage
#[utoipa::path(
    post,
    path = "/admin/uploads",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, body = UploadResponse),
        (status = 400, description = "Missing file, not an image, or larger than 5 MiB"),
        (status = 502, description = "Storage rejected the upload")
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::InvalidRequest("only image files can be uploaded".to_string()));
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
        if bytes.is_empty() {
            return Err(AppError::InvalidRequest("file is empty".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::InvalidRequest("file must be 5 MiB or smaller".to_string()));
        }

        let path = object_name(&filename, Utc::now().timestamp_millis());
        let url = state.storage.upload(&path, &content_type, bytes.to_vec()).await?;

        tracing::info!(%path, size = bytes.len(), "image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadResponse { success: true, url })));
    }

    Err(AppError::InvalidRequest("no file provided".to_string()))
}
