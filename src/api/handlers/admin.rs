use axum::extract::State;

use crate::{
    api::{middleware::auth::AdminUser, response::ApiResponse, state::AppState},
    domain::DashboardStats,
    error::Result,
};

pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<ApiResponse<DashboardStats>> {
    let stats = state.service_context.stats_repo.dashboard().await?;
    Ok(ApiResponse::ok(stats))
}
