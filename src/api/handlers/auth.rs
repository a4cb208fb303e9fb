use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use crate::{
    api::{
        middleware::auth::{session_token, CurrentUser},
        response::ApiResponse,
        state::AppState,
    },
    auth::AuthService,
    domain::*,
    error::Result,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub member: Member,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<Member>)> {
    let registered = state.service_context.member_service.register(request).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Registration successful. Please check your email to verify your account.",
            registered.member,
        ),
    ))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<ApiResponse<Member>> {
    request.validate()?;
    let member = state.service_context.member_service.verify_email(&request.token).await?;

    Ok(ApiResponse::with_message("Email verified successfully", member))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Json(request): Json<ResendVerificationRequest>,
) -> Result<ApiResponse<()>> {
    request.validate()?;
    state.service_context.member_service.resend_verification(&request.email).await?;

    Ok(ApiResponse::message("Verification email sent"))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>)> {
    request.validate()?;

    let member = state.service_context.member_service
        .authenticate(&request.email, &request.password)
        .await?;

    let auth_service = &state.service_context.auth_service;
    let (session, token) = auth_service.create_session(member.id).await?;

    let secure = state.settings.server.base_url.starts_with("https://");
    let cookie = auth_service.create_session_cookie(&token, secure);

    tracing::info!("Member {} logged in", member.id);

    Ok((
        jar.add(cookie),
        ApiResponse::with_message("Login successful", LoginResponse {
            token,
            expires_at: session.expires_at,
            member,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<()>)> {
    if let Some(token) = session_token(&headers, &jar) {
        state.service_context.auth_service.invalidate_session(&token).await?;
    }

    Ok((
        jar.add(AuthService::create_logout_cookie()),
        ApiResponse::message("Logged out"),
    ))
}

pub async fn me(current: CurrentUser) -> Result<ApiResponse<Member>> {
    Ok(ApiResponse::ok(current.member))
}

pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>> {
    state.service_context.member_service
        .change_password(current.member.id, request)
        .await?;

    Ok(ApiResponse::message("Password updated. Please log in again."))
}
