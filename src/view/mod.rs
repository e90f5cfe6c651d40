//! HTML rendering
//!
//! Tera templates are compiled into the binary from `templates/` and loaded
//! once at startup. Static assets from `assets/` are embedded the same way.

use serde::Serialize;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::ViewError;

use rust_embed::RustEmbed;

/// Embedded page templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct Templates;

/// Embedded stylesheets and images
#[derive(RustEmbed)]
#[folder = "assets/"]
#[include = "*"]
pub struct Assets;

/// The signed-in redactor as seen by templates
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUserView {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

/// Variables every page receives
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub current_user: Option<CurrentUserView>,
    pub request_path: String,
}

/// Template engine over the embedded templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load every embedded template
    pub fn new() -> Result<Self, ViewError> {
        let mut templates = Vec::new();
        for name in Templates::iter() {
            let file = Templates::get(&name)
                .ok_or_else(|| ViewError::InvalidAsset(name.to_string()))?;
            let content = std::str::from_utf8(&file.data)
                .map_err(|e| ViewError::InvalidAsset(format!("{}: {}", name, e)))?
                .to_string();
            templates.push((name.to_string(), content));
        }
        Self::from_sources(templates)
    }

    /// Build from `(name, source)` pairs
    pub fn from_sources(mut templates: Vec<(String, String)>) -> Result<Self, ViewError> {
        // Parents before children
        templates.sort_by(|a, b| {
            let a_is_base = a.0 == "base.html" || a.0.ends_with("/base.html");
            let b_is_base = b.0 == "base.html" || b.0.ends_with("/base.html");
            b_is_base.cmp(&a_is_base).then_with(|| a.0.cmp(&b.0))
        });

        let count = templates.len();
        let mut tera = Tera::default();
        tera.add_raw_templates(templates).map_err(|e| {
            ViewError::TemplateError(with_causes("Failed to load templates".into(), &e))
        })?;
        tera.build_inheritance_chains().map_err(|e| {
            ViewError::TemplateError(with_causes("Failed to build template inheritance".into(), &e))
        })?;

        tracing::debug!(count, "Templates loaded");
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ViewError> {
        self.tera.render(template, context).map_err(|e| {
            ViewError::TemplateError(with_causes(format!("Failed to render '{}'", template), &e))
        })
    }

    /// Render with `current_user` and `request_path` added
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        page: &PageContext,
    ) -> Result<String, ViewError> {
        let mut full_context = context.clone();
        full_context.insert("request_path", &page.request_path);
        full_context.insert("current_user", &page.current_user);
        self.render(template, &full_context)
    }
}

fn with_causes(prefix: String, err: &tera::Error) -> String {
    let mut message = format!("{}: {}", prefix, err);
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  Caused by: {}", cause));
        source = cause.source();
    }
    message
}
