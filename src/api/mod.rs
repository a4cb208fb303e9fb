pub mod handlers;
pub mod middleware;
pub mod response;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    media::{MAX_FILE_SIZE, UPLOADS_ROUTE},
    service::ServiceContext,
};
use state::AppState;

/// Multipart framing on top of the largest accepted file.
const UPLOAD_BODY_OVERHEAD: usize = 1024 * 1024;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let cors = cors_layer(settings.server.cors_origin.as_deref());
    let uploads = ServeDir::new(&settings.server.uploads_dir);
    let app_state = AppState::new(service_context, settings);

    Router::new()
        .route("/", get(handlers::root::root))
        .nest("/api", api_routes())
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::auth::resolve_session,
        ))
        .with_state(app_state)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };

    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!("Ignoring invalid cors_origin {:?}, allowing any origin", origin);
            CorsLayer::permissive()
        }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::root::health_check))
        .nest("/auth", auth_routes())
        .nest("/members", member_routes())
        .nest("/events", event_routes())
        .nest("/workshops", workshop_routes())
        .nest("/registrations", registration_routes())
        .nest("/blogs", blog_routes())
        .nest("/projects", project_routes())
        .nest("/contact", contact_routes())
        .nest("/newsletter", newsletter_routes())
        .nest("/media", media_routes())
        .nest("/admin", admin_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/verify-email", post(handlers::auth::verify_email))
        .route("/resend-verification", post(handlers::auth::resend_verification))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .route("/password", put(handlers::auth::change_password))
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::members::list))
        .route("/leaderboard", get(handlers::members::leaderboard))
        .route("/me", put(handlers::members::update_me))
        .route(
            "/:id",
            get(handlers::members::get).delete(handlers::members::delete),
        )
        .route("/:id/role", put(handlers::members::update_role))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::events::list).post(handlers::events::create))
        .route("/attendance", post(handlers::events::attendance))
        .route(
            "/:id",
            get(handlers::events::get)
                .put(handlers::events::update)
                .delete(handlers::events::delete),
        )
        .route("/:id/register", post(handlers::events::register))
        .route("/:id/cancel", post(handlers::events::cancel))
        .route("/:id/registrations", get(handlers::events::registrations))
        .route("/:id/qr", get(handlers::events::qr))
}

fn workshop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::workshops::list).post(handlers::workshops::create))
        .route("/attendance", post(handlers::workshops::attendance))
        .route(
            "/:id",
            get(handlers::workshops::get)
                .put(handlers::workshops::update)
                .delete(handlers::workshops::delete),
        )
        .route("/:id/register", post(handlers::workshops::register))
        .route("/:id/cancel", post(handlers::workshops::cancel))
        .route("/:id/registrations", get(handlers::workshops::registrations))
        .route(
            "/:id/registrations/:member_id/confirm",
            post(handlers::workshops::confirm),
        )
        .route("/:id/qr", get(handlers::workshops::qr))
}

fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::registrations::mine))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth))
}

fn blog_routes() -> Router<AppState> {
    // GET /:id takes a slug; the write routes take the blog's uuid.
    Router::new()
        .route("/", get(handlers::blogs::list).post(handlers::blogs::create))
        .route("/mine", get(handlers::blogs::mine))
        .route("/pending", get(handlers::blogs::pending))
        .route(
            "/:id",
            get(handlers::blogs::get)
                .put(handlers::blogs::update)
                .delete(handlers::blogs::delete),
        )
        .route("/:id/approve", post(handlers::blogs::approve))
        .route("/:id/reject", post(handlers::blogs::reject))
}

fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::projects::list).post(handlers::projects::create))
        .route("/mine", get(handlers::projects::mine))
        .route("/pending", get(handlers::projects::pending))
        .route(
            "/:id",
            get(handlers::projects::get).delete(handlers::projects::delete),
        )
        .route("/:id/approve", post(handlers::projects::approve))
        .route("/:id/reject", post(handlers::projects::reject))
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::contact::submit).get(handlers::contact::list))
        .route("/:id/status", put(handlers::contact::update_status))
}

fn newsletter_routes() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(handlers::newsletter::subscribe))
        .route("/unsubscribe", post(handlers::newsletter::unsubscribe))
        .route("/subscribers", get(handlers::newsletter::subscribers))
}

fn media_routes() -> Router<AppState> {
    Router::new().route(
        "/upload",
        post(handlers::media::upload)
            .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + UPLOAD_BODY_OVERHEAD)),
    )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::admin::stats))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_admin))
}
