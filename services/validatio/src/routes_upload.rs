use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{api_error, ApiResult};
use crate::object_store::OCTET_STREAM;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct FilenameQuery {
    pub filename: Option<String>,
}

impl FilenameQuery {
    fn key(self) -> ApiResult<String> {
        self.filename
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "filename required"))
    }
}

/// Proxies the raw request body into the bucket under `?filename=`.
pub async fn upload(
    State(state): State<SharedState>,
    Query(q): Query<FilenameQuery>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let key = q.key()?;
    let size = body.len();
    state
        .objects
        .put_object(&key, body, OCTET_STREAM)
        .await
        .map_err(|e| {
            tracing::error!(key = %key, error = %e, "s3 upload failed");
            api_error(StatusCode::BAD_GATEWAY, format!("{e:#}"))
        })?;
    tracing::info!(key = %key, bytes = size, "object uploaded");
    Ok(Json(json!({ "ok": true })))
}

/// `GET ?filename=`: presigned `PUT` for an octet-stream upload.
pub async fn presign(
    State(state): State<SharedState>,
    Query(q): Query<FilenameQuery>,
) -> ApiResult<Json<Value>> {
    let key = q.key()?;
    let url = presigned_put(&state, &key, OCTET_STREAM).await?;
    Ok(Json(json!({ "url": url, "bucket": state.objects.bucket(), "key": key })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub file_name: String,
    pub content_type: Option<String>,
}

/// `POST {fileName, contentType}`: presigned `PUT` signed for the caller's
/// content type, which the upload must repeat.
pub async fn presign_for_file(
    State(state): State<SharedState>,
    Json(req): Json<PresignRequest>,
) -> ApiResult<Json<Value>> {
    let key = req.file_name.trim().to_string();
    if key.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "fileName required"));
    }
    let content_type = req
        .content_type
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| OCTET_STREAM.to_string());
    let url = presigned_put(&state, &key, &content_type).await?;
    Ok(Json(json!({ "url": url, "key": key })))
}

async fn presigned_put(state: &SharedState, key: &str, content_type: &str) -> ApiResult<String> {
    let expires = Duration::from_secs(state.config.presign_expires_secs);
    state
        .objects
        .presign_put(key, content_type, expires)
        .await
        .map_err(|e| {
            tracing::error!(key = %key, error = %e, "presign failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        })
}
