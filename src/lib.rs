use handlebars::Handlebars;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod templates;

use auth::AdminCredentials;
use backend::BackendClient;
use config::Config;
use session::SessionGuard;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load templates: {0}")]
    Templates(#[from] handlebars::TemplateError),

    #[error("Template {0} not found in template directory")]
    MissingTemplate(&'static str),

    #[error("Failed to build backend client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid admin credentials: {0}")]
    Credentials(String),
}

/// Read-only state shared by every request.
pub struct AppState {
    pub config: Config,
    pub templates: Handlebars<'static>,
    pub backend: BackendClient,
    pub session: SessionGuard,
    pub credentials: AdminCredentials,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let templates = templates::load_templates(&config.template_dir, config.template_dev_mode)?;

        let backend = BackendClient::new(config.backend_url.clone(), config.backend_timeout)?;

        let session = SessionGuard::new(
            config.session_secret.as_deref(),
            config.cookie_secure,
            config.session_timeout,
        );

        let credentials =
            AdminCredentials::new(config.admin_username.clone(), &config.admin_password)
                .map_err(|e| StartupError::Credentials(e.to_string()))?;

        Ok(Self {
            config,
            templates,
            backend,
            session,
            credentials,
        })
    }
}

/// A post listing entry as returned by the backend.
///
/// The backend writes lowercase keys; older payloads use PascalCase. Both are
/// accepted and `null` decodes to an empty value. Templates see PascalCase.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all(serialize = "PascalCase"))]
pub struct Post {
    #[serde(default, alias = "Title", deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(
        default,
        alias = "FileName",
        alias = "fileName",
        alias = "filename",
        deserialize_with = "null_as_default"
    )]
    pub file_name: String,
    #[serde(default, alias = "Description", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(
        default,
        alias = "DatePublished",
        alias = "datePublished",
        alias = "datepublished",
        deserialize_with = "null_as_default"
    )]
    pub date_published: String,
    #[serde(default, alias = "Tags", deserialize_with = "list_or_joined")]
    pub tags: Vec<String>,
    #[serde(default, alias = "Content", deserialize_with = "null_as_default")]
    pub content: String,
}

/// Rendered body and metadata of a single post.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all(serialize = "PascalCase"))]
pub struct PostContent {
    pub metadata: Map<String, Value>,
    /// Backend-rendered HTML, inserted into pages unescaped.
    pub content: String,
}

/// Splits a comma separated tag field, dropping blanks.
pub fn split_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// Posts edited through the form may carry tags as a single string.
fn list_or_joined<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        Some(Tags::List(tags)) => tags,
        Some(Tags::Joined(joined)) => split_tags(&joined),
        None => Vec::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_accepts_pascal_case_listing() {
        let posts: Vec<Post> =
            serde_json::from_str(r#"[{"Title":"Hello","FileName":"hello.md","Tags":["intro"]}]"#)
                .unwrap();

        assert_eq!(
            posts,
            vec![Post {
                title: "Hello".into(),
                file_name: "hello.md".into(),
                tags: vec!["intro".into()],
                ..Post::default()
            }]
        );
    }

    #[test]
    fn post_accepts_backend_lowercase_keys_and_nulls() {
        let post: Post = serde_json::from_value(json!({
            "filename": "draft",
            "title": null,
            "description": "A draft",
            "datepublished": "2024-05-01",
            "tags": null,
            "unknown": 42
        }))
        .unwrap();

        assert_eq!(post.file_name, "draft");
        assert_eq!(post.title, "");
        assert_eq!(post.description, "A draft");
        assert_eq!(post.date_published, "2024-05-01");
        assert!(post.tags.is_empty());
    }

    #[test]
    fn post_accepts_comma_joined_tags() {
        let post: Post =
            serde_json::from_value(json!({"filename": "hello", "tags": "rust, web,,"})).unwrap();
        assert_eq!(post.tags, vec!["rust", "web"]);

        let empty: Post = serde_json::from_value(json!({"filename": "x", "tags": ""})).unwrap();
        assert!(empty.tags.is_empty());
    }

    #[test]
    fn split_tags_trims_and_drops_blanks() {
        assert_eq!(split_tags(" a ,b,, c "), vec!["a", "b", "c"]);
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn post_serializes_with_template_keys() {
        let value = serde_json::to_value(Post {
            title: "Hello".into(),
            file_name: "hello".into(),
            ..Post::default()
        })
        .unwrap();

        assert_eq!(value["Title"], "Hello");
        assert_eq!(value["FileName"], "hello");
        assert!(value.get("DatePublished").is_some());
    }

    #[test]
    fn post_content_requires_content_and_metadata() {
        let ok: PostContent = serde_json::from_value(json!({
            "metadata": {"title": "Hi", "tags": ["a"]},
            "content": "<p>Hi</p>"
        }))
        .unwrap();
        assert_eq!(ok.content, "<p>Hi</p>");
        assert_eq!(ok.metadata["title"], "Hi");

        assert!(serde_json::from_value::<PostContent>(json!({"content": "<p/>"})).is_err());
        assert!(
            serde_json::from_value::<PostContent>(json!({"metadata": {}, "content": 3})).is_err()
        );
    }
}
