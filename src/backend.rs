//! Client for the rendering/storage backend.
//!
//! The backend exposes a single collection endpoint; every operation here is
//! exactly one HTTP call against it.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, Url, header, multipart};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::WebError;
use crate::{Post, PostContent};

/// Raw backend reply relayed to the caller as-is.
#[derive(Debug)]
pub struct BackendReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl BackendReply {
    async fn read(resp: reqwest::Response) -> Result<Self, WebError> {
        let status = resp.status();
        let content_type = resp.headers().get(header::CONTENT_TYPE).cloned();
        Ok(Self {
            status,
            content_type,
            body: resp.bytes().await?,
        })
    }
}

impl IntoResponse for BackendReply {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        // Bytes defaults to application/octet-stream; only the backend's type goes out.
        match self.content_type {
            Some(content_type) => {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, content_type);
            }
            None => {
                response.headers_mut().remove(header::CONTENT_TYPE);
            }
        }
        response
    }
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, WebError> {
        let resp = self.http.get(self.base_url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "backend refused post listing");
            return Err(WebError::BackendStatus {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to fetch posts",
            });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| WebError::MalformedResponse(format!("post listing: {e}")))
    }

    pub async fn fetch_post(&self, name: &str) -> Result<PostContent, WebError> {
        let resp = self
            .http
            .get(self.base_url.clone())
            .query(&[("name", name)])
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            debug!(name, status = %resp.status(), "post not found on backend");
            return Err(WebError::NotFound);
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| WebError::MalformedResponse(format!("post {name}: {e}")))
    }

    /// Re-encodes the file as a fresh multipart body with a single `file` part.
    pub async fn upload(&self, file_name: &str, contents: Bytes) -> Result<BackendReply, WebError> {
        let part = multipart::Part::bytes(contents.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(self.base_url.clone())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            warn!(%status, file_name, "file upload failed");
            return Err(WebError::BackendStatus {
                status,
                message: "File upload failed",
            });
        }

        BackendReply::read(resp).await
    }

    pub async fn update_metadata(
        &self,
        file_path: &str,
        metadata: &Map<String, Value>,
    ) -> Result<BackendReply, WebError> {
        let body = serde_json::to_vec(metadata)
            .map_err(|e| WebError::Internal(format!("Failed to encode metadata: {e}")))?;

        let resp = self
            .http
            .patch(self.base_url.clone())
            .query(&[("filePath", file_path)])
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, file_path, "metadata update rejected");
        }

        BackendReply::read(resp).await
    }

    pub async fn delete_post(&self, filename: &str) -> Result<BackendReply, WebError> {
        let resp = self
            .http
            .delete(self.base_url.clone())
            .query(&[("filename", filename)])
            .send()
            .await?;

        let status = resp.status();
        debug!(%status, filename, "backend delete answered");
        if status != StatusCode::OK {
            warn!(%status, filename, "failed to delete post");
            return Err(WebError::BackendStatus {
                status,
                message: "Failed to delete post",
            });
        }

        BackendReply::read(resp).await
    }
}
