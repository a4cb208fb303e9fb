use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        middleware::auth::{AdminUser, CurrentUser},
        response::{ApiResponse, PageParams},
        state::AppState,
    },
    domain::*,
    error::Result,
    repository::ActivityFilter,
    service::registration_service::AttendanceQr,
};

#[derive(Debug, Deserialize)]
pub struct ActivityListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttendanceRequest {
    #[validate(length(min = 1, message = "Attendance token is required"))]
    pub token: String,
}

pub async fn list(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Query(query): Query<ActivityListQuery>,
) -> Result<ApiResponse<Vec<Event>>> {
    let page = PageParams::new(query.page, query.limit);
    let filter = ActivityFilter {
        upcoming_only: query.upcoming,
        include_unpublished: viewer.map(|v| v.member.is_admin()).unwrap_or(false),
    };

    let (events, total) = state.service_context.activity_service
        .list_events(filter, page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(events, page.pagination(total)))
}

pub async fn get(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Event>> {
    let is_admin = viewer.map(|v| v.member.is_admin()).unwrap_or(false);
    let event = state.service_context.activity_service.get_event(id, is_admin).await?;
    Ok(ApiResponse::ok(event))
}

pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<EventRequest>,
) -> Result<(StatusCode, ApiResponse<Event>)> {
    let event = state.service_context.activity_service
        .create_event(request, admin.member.id)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::with_message("Event created", event)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<EventRequest>,
) -> Result<ApiResponse<Event>> {
    let event = state.service_context.activity_service.update_event(id, request).await?;
    Ok(ApiResponse::with_message("Event updated", event))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>> {
    state.service_context.activity_service.delete_event(id).await?;
    Ok(ApiResponse::message("Event deleted"))
}

pub async fn register(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, ApiResponse<Registration>)> {
    let registration = state.service_context.registration_service
        .register(ActivityKind::Event, id, current.member.id)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::with_message("Registered for event", registration)))
}

pub async fn cancel(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Registration>> {
    let registration = state.service_context.registration_service
        .cancel(ActivityKind::Event, id, current.member.id)
        .await?;

    Ok(ApiResponse::with_message("Registration cancelled", registration))
}

pub async fn registrations(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Vec<RegistrationWithMember>>> {
    let registrations = state.service_context.registration_service
        .list_for_activity(ActivityKind::Event, id)
        .await?;

    Ok(ApiResponse::ok(registrations))
}

pub async fn qr(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AttendanceQr>> {
    let qr = state.service_context.registration_service
        .attendance_qr(ActivityKind::Event, id, current.member.id)
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
        .mark_attendance(ActivityKind::Event, &request.token)
        .await?;

    Ok(ApiResponse::with_message("Attendance recorded", registration))
}
