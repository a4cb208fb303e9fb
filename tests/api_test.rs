mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use clubhouse::{api::create_app, config::Settings, domain::*};
use common::{event_request, test_context};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn get(uri: &str, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    Ok(builder.body(Body::empty())?)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn test_health_and_root() -> anyhow::Result<()> {
    let settings = Settings::default();
    let (_pool, ctx) = test_context(&settings).await?;
    let app = create_app(ctx, Arc::new(settings));

    let (status, body) = send(&app, get("/api/health", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, get("/", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Clubhouse API");

    Ok(())
}

#[tokio::test]
async fn test_register_verify_login_flow() -> anyhow::Result<()> {
    let settings = Settings::default();
    let (_pool, ctx) = test_context(&settings).await?;
    let app = create_app(ctx.clone(), Arc::new(settings));

    let (status, body) = send(&app, post_json("/api/auth/register", None, json!({
        "name": "Meera Iyer",
        "email": "meera@example.com",
        "password": "s3cure-pass",
        "department": "ece"
    }))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["unique_id"], "DAIC-ECE-00001");

    // Unverified accounts cannot sign in
    let login = json!({ "email": "meera@example.com", "password": "s3cure-pass" });
    let (status, body) = send(&app, post_json("/api/auth/login", None, login.clone())?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let token = ctx.member_service.resend_verification("meera@example.com").await?;
    let (status, _) = send(&app, post_json("/api/auth/verify-email", None, json!({ "token": token }))?).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/api/auth/login", None, login)?).await?;
    assert_eq!(status, StatusCode::OK);
    let session = body["data"]["token"].as_str().unwrap_or_default().to_string();
    assert!(!session.is_empty());

    let (status, body) = send(&app, get("/api/auth/me", Some(&session))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "meera@example.com");

    let (status, _) = send(&app, get("/api/registrations/me", Some(&session))?).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, post_json("/api/auth/logout", Some(&session), json!({}))?).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/api/auth/me", Some(&session))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_admin_routes_require_admin() -> anyhow::Result<()> {
    let settings = Settings::default();
    let (pool, ctx) = test_context(&settings).await?;
    let app = create_app(ctx.clone(), Arc::new(settings));

    let member = common::insert_member(&pool, 1, None).await?;
    let (_, member_token) = ctx.auth_service.create_session(member.id).await?;

    let admin = common::insert_member(&pool, 2, None).await?;
    ctx.member_repo.update_role(admin.id, MemberRole::Admin).await?;
    let (_, admin_token) = ctx.auth_service.create_session(admin.id).await?;

    let (status, body) = send(&app, get("/api/admin/stats", None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");

    let (status, body) = send(&app, get("/api/admin/stats", Some(&member_token))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, body) = send(&app, get("/api/admin/stats", Some(&admin_token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_members"], 2);

    let event = serde_json::to_value(event_request("Systems Reading Group", Some(2)))?;
    let (status, _) = send(&app, post_json("/api/events", Some(&member_token), event.clone())?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, post_json("/api/events", Some(&admin_token), event)?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = body["data"]["id"].as_str().unwrap_or_default().to_string();

    let uri = format!("/api/events/{}/register", event_id);
    let (status, body) = send(&app, post_json(&uri, Some(&member_token), json!({}))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "CONFIRMED");

    let (status, body) = send(&app, post_json(&uri, Some(&member_token), json!({}))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Already registered for this event");

    let (status, body) = send(&app, get("/api/events?page=1&limit=5", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["limit"], 5);

    Ok(())
}
