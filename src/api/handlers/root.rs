use axum::{extract::State, http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

use crate::api::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Clubhouse API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Members, events, workshops and content for a university club",
        "status": "operational",
        "endpoints": {
            "health": "/api/health",
            "auth": "/api/auth",
            "members": "/api/members",
            "events": "/api/events",
            "workshops": "/api/workshops",
            "blogs": "/api/blogs",
            "projects": "/api/projects",
            "admin": "/api/admin"
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.service_context.db_pool)
        .await
        .is_ok();

    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (status, Json(json!({
        "success": database,
        "status": if database { "healthy" } else { "degraded" },
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
