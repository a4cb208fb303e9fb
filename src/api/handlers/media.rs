use axum::extract::{Multipart, State};
use axum::http::StatusCode;

use crate::{
    api::{middleware::auth::CurrentUser, response::ApiResponse, state::AppState},
    error::{AppError, Result},
    media::{save_uploaded_file, StoredMedia},
};

/// Accepts a single image in the `file` field of a multipart form.
pub async fn upload(
    State(state): State<AppState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, ApiResponse<StoredMedia>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let stored = save_uploaded_file(&state.settings.server.uploads_dir, &filename, &data).await?;
        tracing::info!("Member {} uploaded {}", current.member.id, stored.filename);

        return Ok((StatusCode::CREATED, ApiResponse::with_message("File uploaded", stored)));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}
