use axum::extract::State;

use crate::{
    api::{middleware::auth::CurrentUser, response::ApiResponse, state::AppState},
    domain::Registration,
    error::Result,
};

pub async fn mine(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<ApiResponse<Vec<Registration>>> {
    let registrations = state.service_context.registration_service
        .list_for_member(current.member.id)
        .await?;

    Ok(ApiResponse::ok(registrations))
}
