use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        middleware::auth::AdminUser,
        response::{ApiResponse, PageParams},
        state::AppState,
    },
    domain::*,
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<ContactStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ContactStatusRequest {
    pub status: ContactStatus,
}

pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, ApiResponse<ContactMessage>)> {
    let message = state.service_context.contact_service.submit(request).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Thanks for reaching out, we will get back to you soon", message),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ContactListQuery>,
) -> Result<ApiResponse<Vec<ContactMessage>>> {
    let page = PageParams::new(query.page, query.limit);
    let (messages, total) = state.service_context.contact_service
        .list(query.status, page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(messages, page.pagination(total)))
}

pub async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ContactStatusRequest>,
) -> Result<ApiResponse<ContactMessage>> {
    let message = state.service_context.contact_service
        .update_status(id, request.status)
        .await?;

    Ok(ApiResponse::with_message("Status updated", message))
}
