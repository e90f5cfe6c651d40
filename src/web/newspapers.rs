//! Newspaper pages
//!
//! - GET /newspapers/ - paginated list, optional `title` filter
//! - GET /newspapers/{id}/ - detail with topics and publishers
//! - GET/POST /newspapers/create/
//! - GET/POST /newspapers/{id}/update/
//! - GET/POST /newspapers/{id}/delete/

use anyhow::Context;
use axum::extract::{Query, State};
use axum::Form;
use serde::Deserialize;
use tera::Context as TeraContext;

use super::common::{found, render, ObjectPath, Page, WebResult};
use super::{AppState, WebError};
use crate::admin::Choice;
use crate::forms::{FormData, FormErrors, NewspaperForm, NewspaperSearchForm};
use crate::models::{ListParams, PAGE_SIZE};
use crate::view::PageContext;

const LIST_URL: &str = "/newspapers/";

#[derive(Debug, Deserialize)]
pub struct NewspaperListQuery {
    pub page: Option<String>,
    pub title: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Page(page): Page,
    Query(query): Query<NewspaperListQuery>,
) -> WebResult {
    let params = ListParams::from_query(query.page.as_deref(), PAGE_SIZE);
    let search_title = query.title.unwrap_or_default();

    // An invalid search box lists everything and shows the error
    let search = FormData::from_pairs([("title", search_title.as_str())]);
    let (title, search_errors) = match NewspaperSearchForm::clean(&search) {
        Ok(form) => (form.title, FormErrors::default()),
        Err(errors) => (None, errors),
    };

    let result = state.newspapers.list(&params, title.as_deref()).await?;
    if result.is_out_of_range() {
        return Err(WebError::NotFound);
    }

    let mut context = TeraContext::new();
    context.insert("page", &result.page_info());
    context.insert("newspapers", &result.items);
    context.insert("search_title", &search_title);
    context.insert("search_errors", &search_errors);
    if let Some(title) = &title {
        let query = serde_urlencoded::to_string([("title", title.as_str())])
            .context("Failed to encode the search query")?;
        context.insert("page_query", &format!("&{}", query));
    }
    render(&state, &page, "newspaper_list.html", &context)
}

pub async fn detail(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
) -> WebResult {
    let newspaper = state.newspapers.get(id).await?;
    let mut context = TeraContext::new();
    context.insert("newspaper", &newspaper);
    render(&state, &page, "newspaper_detail.html", &context)
}

async fn choices(
    state: &AppState,
    table: &'static str,
    label_column: &'static str,
    selected: &[String],
) -> Result<Vec<Choice>, WebError> {
    Ok(state
        .choices
        .choices(table, label_column)
        .await?
        .into_iter()
        .map(|(id, label)| {
            let id = id.to_string();
            Choice {
                selected: selected.contains(&id),
                id,
                label,
            }
        })
        .collect())
}

async fn form_page(
    state: &AppState,
    page: &PageContext,
    object: Option<String>,
    data: &FormData,
    errors: &FormErrors,
) -> WebResult {
    let mut context = TeraContext::new();
    context.insert("object", &object);
    context.insert("form", &data.values());
    context.insert("errors", errors);
    context.insert(
        "topic_choices",
        &choices(state, "topics", "name", data.get_all("topic")).await?,
    );
    context.insert(
        "publisher_choices",
        &choices(state, "redactors", "username", data.get_all("publishers")).await?,
    );
    render(state, page, "newspaper_form.html", &context)
}

pub async fn create_form(State(state): State<AppState>, Page(page): Page) -> WebResult {
    form_page(&state, &page, None, &FormData::new(), &FormErrors::default()).await
}

pub async fn create(
    State(state): State<AppState>,
    Page(page): Page,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let data = FormData::from(pairs);
    match state.newspapers.create(&data).await {
        Ok(_) => Ok(found(LIST_URL)),
        Err(e) => match e.form_errors() {
            Some(errors) => form_page(&state, &page, None, &data, &errors).await,
            None => Err(e.into()),
        },
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
) -> WebResult {
    let newspaper = state.newspapers.get(id).await?;
    form_page(
        &state,
        &page,
        Some(newspaper.title.clone()),
        &NewspaperForm::initial(&newspaper),
        &FormErrors::default(),
    )
    .await
}

pub async fn update(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let newspaper = state.newspapers.get(id).await?;
    let data = FormData::from(pairs);
    match state.newspapers.update(id, &data).await {
        Ok(_) => Ok(found(LIST_URL)),
        Err(e) => match e.form_errors() {
            Some(errors) => form_page(&state, &page, Some(newspaper.title), &data, &errors).await,
            None => Err(e.into()),
        },
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
) -> WebResult {
    let newspaper = state.newspapers.get(id).await?;
    let mut context = TeraContext::new();
    context.insert("kind", "newspaper");
    context.insert("object", &newspaper.title);
    context.insert("cancel_url", LIST_URL);
    render(&state, &page, "confirm_delete.html", &context)
}

pub async fn delete(State(state): State<AppState>, ObjectPath(id): ObjectPath<i64>) -> WebResult {
    state.newspapers.delete(id).await?;
    Ok(found(LIST_URL))
}
