//! Redactor pages
//!
//! - GET /redactors/ - paginated list
//! - GET /redactors/{id}/ - detail with the newspapers published
//! - GET/POST /redactors/create/
//! - GET/POST /redactors/{id}/update/ - permission flags are never edited here
//! - GET/POST /redactors/{id}/delete/

use axum::extract::{Query, State};
use axum::Form;
use serde::Serialize;
use tera::Context as TeraContext;

use super::common::{found, render, ObjectPath, Page, PageQuery, WebResult};
use super::{AppState, WebError};
use crate::forms::{FormData, FormErrors, RedactorForm};
use crate::models::{ListParams, PAGE_SIZE};
use crate::services::PermissionSource;
use crate::view::PageContext;

const LIST_URL: &str = "/redactors/";

#[derive(Debug, Serialize)]
struct Field {
    name: &'static str,
    label: &'static str,
    kind: &'static str,
    help: &'static str,
}

const fn field(name: &'static str, label: &'static str, kind: &'static str) -> Field {
    Field {
        name,
        label,
        kind,
        help: "",
    }
}

const CREATE_FIELDS: &[Field] = &[
    field("username", "Username", "text"),
    field("first_name", "First name", "text"),
    field("last_name", "Last name", "text"),
    field("email", "Email address", "email"),
    field("years_of_experience", "Years of experience", "number"),
    Field {
        name: "password1",
        label: "Password",
        kind: "password",
        help: "At least 8 characters, not entirely numeric.",
    },
    field("password2", "Password confirmation", "password"),
];

const UPDATE_FIELDS: &[Field] = &[
    field("username", "Username", "text"),
    field("first_name", "First name", "text"),
    field("last_name", "Last name", "text"),
    field("email", "Email address", "email"),
    field("years_of_experience", "Years of experience", "number"),
    Field {
        name: "password1",
        label: "New password",
        kind: "password",
        help: "Leave both password fields blank to keep the current password.",
    },
    field("password2", "New password confirmation", "password"),
];

pub async fn list(
    State(state): State<AppState>,
    Page(page): Page,
    Query(query): Query<PageQuery>,
) -> WebResult {
    let params = ListParams::from_query(query.page.as_deref(), PAGE_SIZE);

    let result = state.redactors.list(&params).await?;
    if result.is_out_of_range() {
        return Err(WebError::NotFound);
    }

    let mut context = TeraContext::new();
    context.insert("page", &result.page_info());
    context.insert("redactors", &result.items);
    render(&state, &page, "redactor_list.html", &context)
}

pub async fn detail(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
) -> WebResult {
    let redactor = state.redactors.get(id).await?;
    let newspapers = state.redactors.published(id).await?;

    let mut context = TeraContext::new();
    context.insert("redactor", &redactor);
    context.insert("newspapers", &newspapers);
    render(&state, &page, "redactor_detail.html", &context)
}

fn form_page(
    state: &AppState,
    page: &PageContext,
    object: Option<String>,
    data: &FormData,
    errors: &FormErrors,
) -> WebResult {
    let fields = if object.is_some() {
        UPDATE_FIELDS
    } else {
        CREATE_FIELDS
    };
    let mut context = TeraContext::new();
    context.insert("object", &object);
    context.insert("fields", fields);
    context.insert("form", &data.values());
    context.insert("errors", errors);
    render(state, page, "redactor_form.html", &context)
}

pub async fn create_form(State(state): State<AppState>, Page(page): Page) -> WebResult {
    let initial = FormData::from_pairs([("years_of_experience", "0")]);
    form_page(&state, &page, None, &initial, &FormErrors::default())
}

pub async fn create(
    State(state): State<AppState>,
    Page(page): Page,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let data = FormData::from(pairs);
    match state.redactors.create(&data).await {
        Ok(_) => Ok(found(LIST_URL)),
        Err(e) => match e.form_errors() {
            Some(errors) => form_page(&state, &page, None, &data, &errors),
            None => Err(e.into()),
        },
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
) -> WebResult {
    let redactor = state.redactors.get(id).await?;
    form_page(
        &state,
        &page,
        Some(redactor.to_string()),
        &RedactorForm::initial(&redactor),
        &FormErrors::default(),
    )
}

pub async fn update(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let redactor = state.redactors.get(id).await?;
    let data = FormData::from(pairs);
    match state
        .redactors
        .update(id, &data, PermissionSource::Keep)
        .await
    {
        Ok(_) => Ok(found(LIST_URL)),
        Err(e) => match e.form_errors() {
            Some(errors) => form_page(&state, &page, Some(redactor.to_string()), &data, &errors),
            None => Err(e.into()),
        },
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
) -> WebResult {
    let redactor = state.redactors.get(id).await?;
    let mut context = TeraContext::new();
    context.insert("kind", "redactor");
    context.insert("object", &redactor.username);
    context.insert("cancel_url", LIST_URL);
    render(&state, &page, "confirm_delete.html", &context)
}

pub async fn delete(State(state): State<AppState>, ObjectPath(id): ObjectPath<i64>) -> WebResult {
    state.redactors.delete(id).await?;
    Ok(found(LIST_URL))
}
