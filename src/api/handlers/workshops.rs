use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        handlers::events::{ActivityListQuery, AttendanceRequest},
        middleware::auth::{AdminUser, CurrentUser},
        response::{ApiResponse, PageParams},
        state::AppState,
    },
    domain::*,
    error::Result,
    repository::ActivityFilter,
    service::registration_service::AttendanceQr,
};

pub async fn list(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Query(query): Query<ActivityListQuery>,
) -> Result<ApiResponse<Vec<Workshop>>> {
    let page = PageParams::new(query.page, query.limit);
    let filter = ActivityFilter {
        upcoming_only: query.upcoming,
        include_unpublished: viewer.map(|v| v.member.is_admin()).unwrap_or(false),
    };

    let (workshops, total) = state.service_context.activity_service
        .list_workshops(filter, page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(workshops, page.pagination(total)))
}

pub async fn get(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Workshop>> {
    let is_admin = viewer.map(|v| v.member.is_admin()).unwrap_or(false);
    let workshop = state.service_context.activity_service.get_workshop(id, is_admin).await?;
    Ok(ApiResponse::ok(workshop))
}

pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<WorkshopRequest>,
) -> Result<(StatusCode, ApiResponse<Workshop>)> {
    let workshop = state.service_context.activity_service
        .create_workshop(request, admin.member.id)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::with_message("Workshop created", workshop)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<WorkshopRequest>,
) -> Result<ApiResponse<Workshop>> {
    let workshop = state.service_context.activity_service.update_workshop(id, request).await?;
    Ok(ApiResponse::with_message("Workshop updated", workshop))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>> {
    state.service_context.activity_service.delete_workshop(id).await?;
    Ok(ApiResponse::message("Workshop deleted"))
}

pub async fn register(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, ApiResponse<Registration>)> {
    let registration = state.service_context.registration_service
        .register(ActivityKind::Workshop, id, current.member.id)
        .await?;

    let message = match registration.status {
        RegistrationStatus::Pending => "Registration received, awaiting approval",
        _ => "Registered for workshop",
    };

    Ok((StatusCode::CREATED, ApiResponse::with_message(message, registration)))
}

pub async fn cancel(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Registration>> {
    let registration = state.service_context.registration_service
        .cancel(ActivityKind::Workshop, id, current.member.id)
        .await?;

    Ok(ApiResponse::with_message("Registration cancelled", registration))
}

pub async fn registrations(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Vec<RegistrationWithMember>>> {
    let registrations = state.service_context.registration_service
        .list_for_activity(ActivityKind::Workshop, id)
        .await?;

    Ok(ApiResponse::ok(registrations))
}

pub async fn confirm(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<Registration>> {
    let registration = state.service_context.registration_service
        .confirm(id, member_id)
        .await?;

    Ok(ApiResponse::with_message("Registration confirmed", registration))
}

pub async fn qr(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AttendanceQr>> {
    let qr = state.service_context.registration_service
        .attendance_qr(ActivityKind::Workshop, id, current.member.id)
        .await?;

    Ok(ApiResponse::ok(qr))
}

pub async fn attendance(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<AttendanceRequest>,
) -> Result<ApiResponse<Registration>> {
    request.validate()?;
    let registration = state.service_context.registration_service
        .mark_attendance(ActivityKind::Workshop, &request.token)
        .await?;

    Ok(ApiResponse::with_message("Workshop completion recorded", registration))
}
