use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    api::{
        middleware::auth::AdminUser,
        response::{ApiResponse, PageQuery},
        state::AppState,
    },
    domain::*,
    error::Result,
};

pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<NewsletterRequest>,
) -> Result<ApiResponse<NewsletterSubscriber>> {
    let subscriber = state.service_context.newsletter_service.subscribe(request).await?;
    Ok(ApiResponse::with_message("Subscribed to the newsletter", subscriber))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<NewsletterRequest>,
) -> Result<ApiResponse<NewsletterSubscriber>> {
    let subscriber = state.service_context.newsletter_service.unsubscribe(request).await?;
    Ok(ApiResponse::with_message("Unsubscribed from the newsletter", subscriber))
}

pub async fn subscribers(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<NewsletterSubscriber>>> {
    let page = query.params();
    let (subscribers, total) = state.service_context.newsletter_service
        .list_active(page.limit, page.offset())
        .await?;

    Ok(ApiResponse::paginated(subscribers, page.pagination(total)))
}
