use axum::response::Html;
use handlebars::{DirectorySourceOptions, Handlebars, handlebars_helper};
use serde::Serialize;

use crate::StartupError;
use crate::error::WebError;

/// Every page the front end can render, one template each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Dashboard,
    PostContent,
    CreatePost,
    EditPost,
    DeletePost,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Home,
        Page::Login,
        Page::Dashboard,
        Page::PostContent,
        Page::CreatePost,
        Page::EditPost,
        Page::DeletePost,
    ];

    pub fn template_name(self) -> &'static str {
        match self {
            Page::Home => "index",
            Page::Login => "login",
            Page::Dashboard => "dashboard",
            Page::PostContent => "post_content",
            Page::CreatePost => "create_post",
            Page::EditPost => "edit_post",
            Page::DeletePost => "delete_post",
        }
    }
}

// Percent-encodes a value for use inside a query string.
handlebars_helper!(urlencode: |s: str| urlencoding::encode(s).into_owned());
// JSON literal of a value; still HTML escaped when used with `{{ }}`.
handlebars_helper!(to_json: |v: Json| serde_json::to_string(v).unwrap_or_default());

/// Parses every `*.hbs` file under `dir` once. In dev mode handlebars
/// re-reads the files on each render instead.
pub fn load_templates(dir: &str, dev_mode: bool) -> Result<Handlebars<'static>, StartupError> {
    let mut templates = Handlebars::new();
    templates.set_dev_mode(dev_mode);
    templates.register_helper("urlencode", Box::new(urlencode));
    templates.register_helper("json", Box::new(to_json));
    templates.register_templates_directory(dir, DirectorySourceOptions::default())?;

    for page in Page::ALL {
        if !templates.has_template(page.template_name()) {
            return Err(StartupError::MissingTemplate(page.template_name()));
        }
    }

    Ok(templates)
}

pub fn render_page<T: Serialize>(
    templates: &Handlebars<'static>,
    page: Page,
    data: &T,
) -> Result<Html<String>, WebError> {
    Ok(Html(templates.render(page.template_name(), data)?))
}
