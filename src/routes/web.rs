use std::sync::Arc;

use axum::Form;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::AppState;
use crate::error::WebError;
use crate::routes::found;
use crate::templates::{Page, render_page};

#[axum::debug_handler]
pub async fn home(app_state: State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    let posts = app_state.backend.list_posts().await?;

    render_page(&app_state.templates, Page::Home, &json!({ "Posts": posts }))
}

#[derive(Deserialize)]
pub struct PostQuery {
    name: Option<String>,
}

#[axum::debug_handler]
pub async fn view_post(
    app_state: State<Arc<AppState>>,
    Query(query): Query<PostQuery>,
) -> Result<Html<String>, WebError> {
    let name = query
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| WebError::BadRequest("Missing 'name' query parameter".to_string()))?;

    let post = app_state.backend.fetch_post(&name).await?;

    render_page(&app_state.templates, Page::PostContent, &post)
}

#[axum::debug_handler]
pub async fn admin_redirect(app_state: State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if app_state.session.is_authenticated(&headers) {
        found("/dashboard")
    } else {
        found("/login")
    }
}

#[derive(Deserialize)]
pub struct LoginQuery {
    error: Option<String>,
}

#[axum::debug_handler]
pub async fn login_view(
    app_state: State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, WebError> {
    render_page(
        &app_state.templates,
        Page::Login,
        &json!({ "error": query.error.is_some() }),
    )
}

#[derive(Deserialize)]
pub struct LoginFormData {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[axum::debug_handler]
pub async fn login_handler(
    app_state: State<Arc<AppState>>,
    Form(form): Form<LoginFormData>,
) -> Result<Response, WebError> {
    let credentials = app_state.credentials.clone();
    let username = form.username.clone();

    // argon2 verification blocks; run it off the async workers.
    let valid =
        tokio::task::spawn_blocking(move || credentials.verify(&form.username, &form.password))
            .await
            .map_err(|e| WebError::Internal(format!("login verification panicked: {e}")))?;

    if !valid {
        warn!(%username, "failed admin login");
        return Ok(found("/login?error=1"));
    }

    info!(%username, "admin logged in");
    Ok((
        StatusCode::FOUND,
        app_state.session.sign_in(),
        [(header::LOCATION, "/dashboard")],
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn logout_handler(app_state: State<Arc<AppState>>) -> Response {
    (
        StatusCode::FOUND,
        app_state.session.sign_out(),
        [(header::LOCATION, "/")],
    )
        .into_response()
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
