//! Login and logout
//!
//! - GET /accounts/login/ - login form
//! - POST /accounts/login/ - sign in, set the session cookie, follow `next`
//! - POST /accounts/logout/ - end the session and clear the cookie

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderValue},
    Form,
};
use serde::Deserialize;
use tera::Context as TeraContext;

use super::common::{found, is_safe_next, render, Page, WebResult};
use super::middleware::{extract_session_token, SESSION_COOKIE};
use super::AppState;
use crate::forms::{FormData, FormErrors};
use crate::services::AuthServiceError;
use crate::view::PageContext;

fn login_page(
    state: &AppState,
    page: &PageContext,
    username: &str,
    next: &str,
    errors: &FormErrors,
) -> WebResult {
    let mut context = TeraContext::new();
    context.insert("username", username);
    context.insert("next", next);
    context.insert("errors", errors);
    render(state, page, "registration/login.html", &context)
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

pub async fn login_form(
    State(state): State<AppState>,
    Page(page): Page,
    Query(query): Query<LoginQuery>,
) -> WebResult {
    let next = query.next.as_deref().unwrap_or("");
    login_page(&state, &page, "", next, &FormErrors::default())
}

pub async fn login(
    State(state): State<AppState>,
    Page(page): Page,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let data = FormData::from(pairs);
    let username = data.get("username").unwrap_or("");
    let password = data.get("password").unwrap_or("");
    let next = data.get("next").unwrap_or("");

    let session = match state.auth.login(username, password).await {
        Ok((_, session)) => session,
        Err(AuthServiceError::AuthenticationError(message))
        | Err(AuthServiceError::ValidationError(message)) => {
            let mut errors = FormErrors::new();
            errors.add_non_field(message);
            return login_page(&state, &page, username, next, &errors);
        }
        Err(e) => return Err(e.into()),
    };

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        session.id,
        state.auth.session_max_age()
    );
    let target = if is_safe_next(next) { next } else { "/" };

    let mut response = found(target);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    Ok(response)
}

pub async fn logout(State(state): State<AppState>, request: Request) -> WebResult {
    if let Some(token) = extract_session_token(&request) {
        state.auth.logout(&token).await?;
    }

    let clear_cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    );
    let mut response = found("/");
    if let Ok(value) = HeaderValue::from_str(&clear_cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    Ok(response)
}
