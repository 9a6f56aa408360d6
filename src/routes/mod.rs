use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod admin;
pub mod web;

// Server-side rendered frontend. /dashboard and every path under /admin/,
// including unknown paths and methods, go through the session guard.
pub fn get_web_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        // Front Page
        .route("/", get(web::home))
        .route("/post", get(web::view_post))
        // Auth
        .route("/admin", get(web::admin_redirect))
        .route("/login", get(web::login_view).post(web::login_handler))
        .route("/logout", get(web::logout_handler))
        // Admin
        .route("/dashboard", get(admin::dashboard))
        .route(
            "/admin/create",
            get(admin::create_view).post(admin::create_handler),
        )
        .route("/admin/upload", post(admin::upload_file))
        .route("/admin/update", patch(admin::update_metadata))
        .route("/admin/edit", get(admin::edit_view).post(admin::edit_handler))
        .route(
            "/admin/delete",
            get(admin::delete_view).delete(admin::delete_post),
        )
        .fallback(web::not_found)
        .layer(middleware::from_fn_with_state(
            app_state,
            admin::require_session,
        ))
}

/// The complete application: routes, static assets and request-wide layers.
pub fn app(app_state: Arc<AppState>) -> Router {
    let config = &app_state.config;

    Router::new()
        .merge(get_web_router(Arc::clone(&app_state)))
        // STATIC CONTENT
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        // STATE
        .with_state(Arc::clone(&app_state))
}

/// `302 Found`, the redirect browsers follow with a GET.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
