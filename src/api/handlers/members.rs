use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        middleware::auth::{AdminUser, CurrentUser},
        response::{ApiResponse, PageParams},
        state::AppState,
    },
    domain::*,
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct MemberListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<MemberListQuery>,
) -> Result<ApiResponse<Vec<Member>>> {
    let page = PageParams::new(query.page, query.limit);
    let (members, total) = state.service_context.member_service
        .list(query.search.as_deref(), page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(members, page.pagination(total)))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<ApiResponse<Vec<LeaderboardEntry>>> {
    let entries = state.service_context.member_service.leaderboard(query.limit).await?;
    Ok(ApiResponse::ok(entries))
}

/// Full record for the member themselves and admins, public profile otherwise.
pub async fn get(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<serde_json::Value>> {
    let member = state.service_context.member_service.get(id).await?;

    let full_access = viewer
        .map(|v| v.member.id == id || v.member.is_admin())
        .unwrap_or(false);

    let body = if full_access {
        serde_json::to_value(member)
    } else {
        serde_json::to_value(MemberProfile::from(member))
    }
    .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;

    Ok(ApiResponse::ok(body))
}

pub async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(update): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<Member>> {
    let member = state.service_context.member_service
        .update_profile(current.member.id, update)
        .await?;

    Ok(ApiResponse::with_message("Profile updated", member))
}

pub async fn update_role(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<ApiResponse<Member>> {
    let member = state.service_context.member_service
        .set_role(&admin.member, id, request.role)
        .await?;

    Ok(ApiResponse::with_message("Role updated", member))
}

pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>> {
    state.service_context.member_service.delete(&admin.member, id).await?;
    Ok(ApiResponse::message("Member deleted"))
}
