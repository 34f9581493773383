//! Receipt evidence upload.
//!
//! Files land in the receipts directory under a fresh UUID name and are
//! served back statically from `/receipts/files/…` (see `build_router`).
//! Only the returned URL is ever stored in the payment ledger.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::extract::MemberContext;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "pdf"];
const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

pub fn receipt_routes() -> Router<AppState> {
    Router::new()
        .route("/receipts", post(upload_receipt))
        .layer(DefaultBodyLimit::max(MAX_RECEIPT_BYTES))
}

/// POST /receipts (member, multipart)
async fn upload_receipt(
    ctx: MemberContext,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Unreadable multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            // Skip non-file fields; the original client sends the file part
            // alongside plain text fields.
            continue;
        };

        let extension = std::path::Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("File name has no extension: {file_name}"))
            })?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Unsupported receipt type .{extension}, expected one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Unreadable file field: {e}")))?;
        if data.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }

        let stored_name = format!("{}.{extension}", Uuid::new_v4());
        let path = state.receipts_dir.join(&stored_name);
        tokio::fs::write(&path, &data).await?;

        info!(
            member_id = %ctx.member_id,
            file = %stored_name,
            bytes = data.len(),
            "Receipt stored"
        );

        return Ok((
            StatusCode::CREATED,
            Json(json!({ "url": format!("/receipts/files/{stored_name}") })),
        ));
    }

    Err(ApiError::BadRequest(
        "Multipart body contained no file".to_string(),
    ))
}
