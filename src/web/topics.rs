//! Topic pages
//!
//! - GET /topics/ - paginated list, `sort=name|-name`
//! - GET/POST /topics/create/
//! - GET/POST /topics/{id}/update/
//! - GET/POST /topics/{id}/delete/

use axum::extract::{Query, State};
use axum::Form;
use serde::Deserialize;
use tera::Context as TeraContext;

use super::common::{found, render, ObjectPath, Page, WebResult};
use super::AppState;
use crate::forms::{FormData, FormErrors, TopicForm};
use crate::models::{ListParams, TopicOrdering, PAGE_SIZE};
use crate::view::PageContext;

const LIST_URL: &str = "/topics/";

#[derive(Debug, Deserialize)]
pub struct TopicListQuery {
    pub page: Option<String>,
    /// `name` or `-name`; anything else keeps the default order
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Page(page): Page,
    Query(query): Query<TopicListQuery>,
) -> WebResult {
    let params = ListParams::from_query(query.page.as_deref(), PAGE_SIZE);
    let ordering = TopicOrdering::from_param(query.sort.as_deref());

    let result = state.topics.list(&params, ordering).await?;
    if result.is_out_of_range() {
        return Err(super::WebError::NotFound);
    }

    let sort = ordering.as_param();
    let mut context = TeraContext::new();
    context.insert("page", &result.page_info());
    context.insert("topics", &result.items);
    context.insert("sort", sort);
    if !sort.is_empty() {
        context.insert("page_query", &format!("&sort={}", sort));
    }
    render(&state, &page, "topic_list.html", &context)
}

fn form_page(
    state: &AppState,
    page: &PageContext,
    object: Option<&str>,
    data: &FormData,
    errors: &FormErrors,
) -> WebResult {
    let mut context = TeraContext::new();
    context.insert("object", &object);
    context.insert("form", &data.values());
    context.insert("errors", errors);
    render(state, page, "topic_form.html", &context)
}

pub async fn create_form(State(state): State<AppState>, Page(page): Page) -> WebResult {
    form_page(&state, &page, None, &FormData::new(), &FormErrors::default())
}

pub async fn create(
    State(state): State<AppState>,
    Page(page): Page,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let data = FormData::from(pairs);
    match state.topics.create(&data).await {
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
    let topic = state.topics.get(id).await?;
    form_page(
        &state,
        &page,
        Some(&topic.name),
        &TopicForm::initial(&topic),
        &FormErrors::default(),
    )
}

pub async fn update(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let topic = state.topics.get(id).await?;
    let data = FormData::from(pairs);
    match state.topics.update(id, &data).await {
        Ok(_) => Ok(found(LIST_URL)),
        Err(e) => match e.form_errors() {
            Some(errors) => form_page(&state, &page, Some(&topic.name), &data, &errors),
            None => Err(e.into()),
        },
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(id): ObjectPath<i64>,
) -> WebResult {
    let topic = state.topics.get(id).await?;
    let mut context = TeraContext::new();
    context.insert("kind", "topic");
    context.insert("object", &topic.name);
    context.insert("cancel_url", LIST_URL);
    render(&state, &page, "confirm_delete.html", &context)
}

pub async fn delete(State(state): State<AppState>, ObjectPath(id): ObjectPath<i64>) -> WebResult {
    state.topics.delete(id).await?;
    Ok(found(LIST_URL))
}
