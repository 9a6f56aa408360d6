use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Every way a request can fail. Converted to a response at the handler
/// boundary; nothing here ever stops the server.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Post not found")]
    NotFound,

    #[error("Backend request failed: {0}")]
    Backend(#[from] reqwest::Error),

    #[error("{message}")]
    BackendStatus {
        status: StatusCode,
        message: &'static str,
    },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Error rendering page: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            WebError::NotFound => (StatusCode::NOT_FOUND, "Post not found").into_response(),
            WebError::BackendStatus { status, message } => (status, message).into_response(),
            WebError::Backend(ref e) => {
                error!(error = %e, "backend request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Backend unavailable").into_response()
            }
            WebError::MalformedResponse(ref msg) => {
                error!(%msg, "malformed backend response");
                (StatusCode::INTERNAL_SERVER_ERROR, "Malformed backend response").into_response()
            }
            WebError::Render(ref e) => {
                error!(error = %e, "template render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error rendering page").into_response()
            }
            WebError::Internal(ref msg) => {
                error!(%msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
