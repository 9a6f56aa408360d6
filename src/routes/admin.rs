use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, Query, Request, State};
use axum::middleware::Next;
use axum::response::{Html, Response};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::backend::BackendReply;
use crate::error::WebError;
use crate::routes::found;
use crate::templates::{Page, render_page};
use crate::{AppState, split_tags};

#[axum::debug_middleware]
pub async fn require_session(
    app_state: State<Arc<AppState>>,
    req: Request,
    nxt: Next,
) -> Response {
    if !is_protected(req.uri().path()) || app_state.session.is_authenticated(req.headers()) {
        return nxt.run(req).await;
    }

    debug!(path = %req.uri().path(), "unauthenticated admin request");
    found("/login")
}

/// `/admin` itself is public; it only redirects.
fn is_protected(path: &str) -> bool {
    path == "/dashboard" || path.starts_with("/admin/")
}

#[axum::debug_handler]
pub async fn dashboard(app_state: State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    render_page(&app_state.templates, Page::Dashboard, &json!({}))
}

#[axum::debug_handler]
pub async fn create_view(app_state: State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    render_page(&app_state.templates, Page::CreatePost, &json!({}))
}

/// Posts are created through `/admin/upload`; a plain form submit just
/// returns to the dashboard.
#[axum::debug_handler]
pub async fn create_handler() -> Response {
    found("/dashboard")
}

#[axum::debug_handler]
pub async fn upload_file(
    app_state: State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<BackendReply, WebError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("Could not get uploaded file: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or_else(|| WebError::BadRequest("Could not get uploaded file".to_string()))?;
        let contents = field
            .bytes()
            .await
            .map_err(|e| WebError::BadRequest(format!("Could not read uploaded file: {e}")))?;

        let stored = app_state.backend.upload(&file_name, contents).await?;
        info!(%file_name, "uploaded post");
        return Ok(stored);
    }

    Err(WebError::BadRequest(
        "Could not get uploaded file".to_string(),
    ))
}

#[derive(Deserialize)]
pub struct UpdateQuery {
    #[serde(rename = "filePath")]
    file_path: Option<String>,
}

/// Relays the backend's status, content type and body unchanged.
#[axum::debug_handler]
pub async fn update_metadata(
    app_state: State<Arc<AppState>>,
    Query(query): Query<UpdateQuery>,
    body: Bytes,
) -> Result<BackendReply, WebError> {
    let file_path = query
        .file_path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| WebError::BadRequest("Filename not provided".to_string()))?;

    let mut metadata: Map<String, Value> = serde_json::from_slice(&body)
        .map_err(|_| WebError::BadRequest("Could not decode metadata".to_string()))?;
    normalize_tags(&mut metadata);

    let reply = app_state
        .backend
        .update_metadata(&file_path, &metadata)
        .await?;
    info!(%file_path, status = %reply.status, "metadata update relayed");

    Ok(reply)
}

/// The edit form submits tags either as one comma separated field or as
/// repeated fields; the backend always gets a list without blanks.
fn normalize_tags(metadata: &mut Map<String, Value>) {
    let tags: Vec<String> = match metadata.get("tags") {
        Some(Value::String(joined)) => split_tags(joined),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(split_tags)
            .collect(),
        _ => return,
    };
    metadata.insert("tags".to_string(), json!(tags));
}

#[derive(Deserialize)]
pub struct EditQuery {
    name: Option<String>,
}

#[axum::debug_handler]
pub async fn edit_view(
    app_state: State<Arc<AppState>>,
    Query(query): Query<EditQuery>,
) -> Result<Html<String>, WebError> {
    let data = match query.name.filter(|n| !n.is_empty()) {
        Some(name) => {
            let mut post = app_state.backend.fetch_post(&name).await?;
            normalize_tags(&mut post.metadata);
            json!({ "Name": name, "Metadata": post.metadata })
        }
        None => json!({}),
    };

    render_page(&app_state.templates, Page::EditPost, &data)
}

/// Metadata edits go through `/admin/update`; a plain form submit just
/// returns to the dashboard.
#[axum::debug_handler]
pub async fn edit_handler() -> Response {
    found("/dashboard")
}

#[axum::debug_handler]
pub async fn delete_view(app_state: State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    let posts = app_state.backend.list_posts().await?;

    render_page(&app_state.templates, Page::DeletePost, &json!({ "Posts": posts }))
}

#[derive(Deserialize)]
pub struct DeleteRequest {
    filename: Option<String>,
}

#[axum::debug_handler]
pub async fn delete_post(
    app_state: State<Arc<AppState>>,
    body: Bytes,
) -> Result<BackendReply, WebError> {
    let request: DeleteRequest = serde_json::from_slice(&body)
        .map_err(|_| WebError::BadRequest("Failed to decode request body".to_string()))?;

    let filename = request
        .filename
        .filter(|n| !n.is_empty())
        .ok_or_else(|| WebError::BadRequest("Filename is required".to_string()))?;

    let reply = app_state.backend.delete_post(&filename).await?;
    info!(%filename, "post deleted");
    Ok(reply)
}
