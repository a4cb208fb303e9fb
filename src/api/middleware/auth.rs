use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::SESSION_COOKIE,
    domain::Member,
    error::{AppError, Result},
};

/// The signed-in member, placed in request extensions by `resolve_session`.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub member: Member,
}

/// A signed-in member with the ADMIN role.
#[derive(Clone, Debug)]
pub struct AdminUser {
    pub member: Member,
}

/// Session token from `Authorization: Bearer <token>`, else the session cookie.
pub fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
}

async fn load_member(state: &AppState, token: &str) -> Result<Option<Member>> {
    let Some(session) = state.service_context.auth_service.validate_session(token).await? else {
        return Ok(None);
    };

    state.service_context.member_repo.find_by_id(session.member_id).await
}

/// Attaches `CurrentUser` when the request carries a valid session. Never
/// rejects; handlers decide via the `CurrentUser` and `AdminUser` extractors.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers(), &jar) {
        match load_member(&state, &token).await {
            Ok(Some(member)) => {
                request.extensions_mut().insert(CurrentUser { member });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Session lookup failed: {:?}", e),
        }
    }

    next.run(request).await
}

pub async fn require_auth(
    current: CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response> {
    if !current.member.is_verified {
        return Err(AppError::Forbidden("Please verify your email first".to_string()));
    }

    Ok(next.run(request).await)
}

pub async fn require_admin(
    admin: AdminUser,
    request: Request,
    next: Next,
) -> Result<Response> {
    tracing::debug!("Admin request by {}", admin.member.id);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let current = CurrentUser::from_request_parts(parts, state).await?;

        if !current.member.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser { member: current.member })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use cookie::Cookie;

    #[test]
    fn test_bearer_preferred_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "from-cookie"));

        assert_eq!(session_token(&headers, &jar).as_deref(), Some("abc"));
        assert_eq!(session_token(&HeaderMap::new(), &jar).as_deref(), Some("from-cookie"));
        assert_eq!(session_token(&HeaderMap::new(), &CookieJar::new()), None);
    }

    #[test]
    fn test_malformed_authorization_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(session_token(&headers, &CookieJar::new()), None);
    }
}
