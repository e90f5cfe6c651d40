//! Web middleware
//!
//! Contains middleware for:
//! - Session lookup from the `session` cookie
//! - Login and staff gates (redirects, never error pages)
//! - Rendering the HTML 404 page for handler errors

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use tera::Context as TeraContext;

use super::common::{login_redirect, page_context, ErrorPage};
use super::AppState;
use crate::models::Redactor;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Signed-in redactor attached to the request
#[derive(Debug, Clone)]
pub struct CurrentRedactor(pub Redactor);

/// Extract the session token from the `Cookie` header
pub fn extract_session_token(request: &Request) -> Option<String> {
    let cookie_header = request.headers().get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;
    cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().strip_prefix("session="))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// Attach the session's redactor, if any; lookup failures leave the request anonymous
pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(&request) {
        match state.auth.validate_session(&token).await {
            Ok(Some(redactor)) => {
                request.extensions_mut().insert(CurrentRedactor(redactor));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

fn next_target(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Anonymous requests go to the login page
pub async fn require_login(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentRedactor>().is_none() {
        return login_redirect(&next_target(&request));
    }
    next.run(request).await
}

/// Anonymous and non-staff requests go to the login page
pub async fn require_staff(request: Request, next: Next) -> Response {
    let allowed = request
        .extensions()
        .get::<CurrentRedactor>()
        .is_some_and(|CurrentRedactor(r)| r.is_active && r.is_staff);
    if !allowed {
        return login_redirect(&next_target(&request));
    }
    next.run(request).await
}

/// Replace the body of marked error responses with the rendered 404 page
pub async fn error_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let page = page_context(&parts);
    let response = next.run(Request::from_parts(parts, body)).await;

    if response.extensions().get::<ErrorPage>().is_none() {
        return response;
    }

    let status = response.status();
    match state
        .templates
        .render_page("404.html", &TeraContext::new(), &page)
    {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {}", e);
            response
        }
    }
}
