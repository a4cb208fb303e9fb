use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{
        middleware::auth::{AdminUser, CurrentUser},
        response::{ApiResponse, PageQuery},
        state::AppState,
    },
    domain::*,
    error::Result,
};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<Project>>> {
    let page = query.params();
    let (projects, total) = state.service_context.project_service
        .list_approved(page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(projects, page.pagination(total)))
}

pub async fn get(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Project>> {
    let viewer = viewer.map(|v| v.member);
    let project = state.service_context.project_service
        .get(id, viewer.as_ref())
        .await?;

    Ok(ApiResponse::ok(project))
}

pub async fn mine(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<ApiResponse<Vec<Project>>> {
    let projects = state.service_context.project_service
        .list_by_owner(current.member.id)
        .await?;

    Ok(ApiResponse::ok(projects))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<ProjectRequest>,
) -> Result<(StatusCode, ApiResponse<Project>)> {
    let project = state.service_context.project_service
        .submit(current.member.id, request)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::with_message("Project submitted for review", project)))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>> {
    state.service_context.project_service.delete(&current.member, id).await?;
    Ok(ApiResponse::message("Project deleted"))
}

pub async fn pending(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<Project>>> {
    let page = query.params();
    let (projects, total) = state.service_context.project_service
        .list_pending(page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(projects, page.pagination(total)))
}

pub async fn approve(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Project>> {
    let project = state.service_context.project_service.approve(id).await?;
    Ok(ApiResponse::with_message("Project approved", project))
}

pub async fn reject(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<ApiResponse<Project>> {
    let project = state.service_context.project_service.reject(id, request).await?;
    Ok(ApiResponse::with_message("Project rejected", project))
}
