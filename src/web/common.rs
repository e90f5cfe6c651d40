//! Shared handler helpers: errors, redirects, rendering and extractors

use axum::{
    extract::{rejection::PathRejection, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::convert::Infallible;
use tera::Context as TeraContext;

use super::middleware::CurrentRedactor;
use super::AppState;
use crate::admin::AdminSaveError;
use crate::services::{
    AuthServiceError, NewspaperServiceError, RedactorServiceError, TopicServiceError,
};
use crate::view::{CurrentUserView, PageContext, ViewError};

/// Marker left on error responses so `error_pages` can render the themed page
#[derive(Debug, Clone, Copy)]
pub struct ErrorPage;

/// Handler failure
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound => {
                let mut response =
                    (StatusCode::NOT_FOUND, Html("<h1>Not found</h1>")).into_response();
                response.extensions_mut().insert(ErrorPage);
                response
            }
            WebError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
            }
            WebError::Internal(err) => {
                tracing::error!("Request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<h1>Server error</h1>"),
                )
                    .into_response()
            }
        }
    }
}

/// Unparseable path segments (`/topics/abc/`) name no object
impl From<PathRejection> for WebError {
    fn from(_: PathRejection) -> Self {
        WebError::NotFound
    }
}

impl From<ViewError> for WebError {
    fn from(err: ViewError) -> Self {
        WebError::Internal(err.into())
    }
}

impl From<TopicServiceError> for WebError {
    fn from(err: TopicServiceError) -> Self {
        match err {
            TopicServiceError::NotFound(_) => WebError::NotFound,
            other => WebError::Internal(other.into()),
        }
    }
}

impl From<RedactorServiceError> for WebError {
    fn from(err: RedactorServiceError) -> Self {
        match err {
            RedactorServiceError::NotFound(_) => WebError::NotFound,
            other => WebError::Internal(other.into()),
        }
    }
}

impl From<NewspaperServiceError> for WebError {
    fn from(err: NewspaperServiceError) -> Self {
        match err {
            NewspaperServiceError::NotFound(_) => WebError::NotFound,
            other => WebError::Internal(other.into()),
        }
    }
}

impl From<AuthServiceError> for WebError {
    fn from(err: AuthServiceError) -> Self {
        WebError::Internal(err.into())
    }
}

impl From<AdminSaveError> for WebError {
    fn from(err: AdminSaveError) -> Self {
        match err {
            AdminSaveError::NotFound(_) => WebError::NotFound,
            other => WebError::Internal(other.into()),
        }
    }
}

pub type WebResult<T = Response> = Result<T, WebError>;

/// `302 Found` to a local path
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// The login page, returning to `next` afterwards
pub fn login_redirect(next: &str) -> Response {
    found(&format!("/accounts/login/?next={}", urlencoding::encode(next)))
}

/// Only same-site absolute paths are followed after login.
/// Browsers drop tabs and newlines from URLs, so `/\t/host` would read as `//host`.
pub fn is_safe_next(next: &str) -> bool {
    if next.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return false;
    }
    next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\")
}

/// `Path` whose rejection is a plain 404
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(WebError))]
pub struct ObjectPath<T>(pub T);

/// `?page=` of a plain paginated list
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// The viewer and path of the current request
pub struct Page(pub PageContext);

impl<S: Send + Sync> FromRequestParts<S> for Page {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Page(page_context(parts)))
    }
}

pub fn page_context(parts: &Parts) -> PageContext {
    let current_user = parts
        .extensions
        .get::<CurrentRedactor>()
        .map(|CurrentRedactor(redactor)| CurrentUserView {
            id: redactor.id,
            username: redactor.username.clone(),
            is_staff: redactor.is_staff,
        });
    PageContext {
        current_user,
        request_path: parts.uri.path().to_string(),
    }
}

/// Render a full page with status 200
pub fn render(
    state: &AppState,
    page: &PageContext,
    template: &str,
    context: &TeraContext,
) -> WebResult {
    let html = state.templates.render_page(template, context, page)?;
    Ok(Html(html).into_response())
}

pub async fn not_found() -> WebError {
    WebError::NotFound
}

pub async fn method_not_allowed() -> WebError {
    WebError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert!(is_safe_next("/topics/"));
        assert!(is_safe_next("/admin/?q=x"));
        assert!(!is_safe_next("//evil.example.com/"));
        assert!(!is_safe_next("/\\evil.example.com"));
        assert!(!is_safe_next("https://evil.example.com/"));
        assert!(!is_safe_next(""));
        assert!(!is_safe_next("/\t/evil.example.com/"));
        assert!(!is_safe_next("/\n/evil.example.com/"));
        assert!(!is_safe_next("/ /evil.example.com/"));
        assert!(!is_safe_next("/topics/\r\nSet-Cookie: x=1"));
    }

    #[test]
    fn test_login_redirect_encodes_next() {
        let response = login_redirect("/topics/?page=2");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/accounts/login/?next=%2Ftopics%2F%3Fpage%3D2"
        );
    }

    #[test]
    fn test_not_found_is_marked_for_error_page() {
        let response = WebError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorPage>().is_some());
    }
}
