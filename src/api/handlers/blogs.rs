use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        middleware::auth::{AdminUser, CurrentUser},
        response::{ApiResponse, PageParams, PageQuery},
        state::AppState,
    },
    domain::*,
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct BlogListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub tag: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<ApiResponse<Vec<Blog>>> {
    let page = PageParams::new(query.page, query.limit);
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let (blogs, total) = state.service_context.blog_service
        .list_approved(tag, page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(blogs, page.pagination(total)))
}

/// Looks a post up by slug. Shares the `:id` segment with the write routes.
pub async fn get(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<Blog>> {
    let viewer = viewer.map(|v| v.member);
    let blog = state.service_context.blog_service
        .get_by_slug(&slug, viewer.as_ref())
        .await?;

    Ok(ApiResponse::ok(blog))
}

pub async fn mine(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<ApiResponse<Vec<Blog>>> {
    let blogs = state.service_context.blog_service
        .list_by_author(current.member.id)
        .await?;

    Ok(ApiResponse::ok(blogs))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<BlogRequest>,
) -> Result<(StatusCode, ApiResponse<Blog>)> {
    let blog = state.service_context.blog_service
        .submit(current.member.id, request)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::with_message("Blog submitted for review", blog)))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<BlogRequest>,
) -> Result<ApiResponse<Blog>> {
    let blog = state.service_context.blog_service
        .update(&current.member, id, request)
        .await?;

    Ok(ApiResponse::with_message("Blog updated and resubmitted for review", blog))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>> {
    state.service_context.blog_service.delete(&current.member, id).await?;
    Ok(ApiResponse::message("Blog deleted"))
}

pub async fn pending(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<Blog>>> {
    let page = query.params();
    let (blogs, total) = state.service_context.blog_service
        .list_pending(page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(blogs, page.pagination(total)))
}

pub async fn approve(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Blog>> {
    let blog = state.service_context.blog_service.approve(id).await?;
    Ok(ApiResponse::with_message("Blog approved", blog))
}

pub async fn reject(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<ApiResponse<Blog>> {
    let blog = state.service_context.blog_service.reject(id, request).await?;
    Ok(ApiResponse::with_message("Blog rejected", blog))
}
