//! Dashboard

use axum::extract::State;
use tera::Context as TeraContext;

use super::common::{render, Page, WebResult};
use super::AppState;

/// Public landing page with entity counts
pub async fn index(State(state): State<AppState>, Page(page): Page) -> WebResult {
    let mut context = TeraContext::new();
    context.insert("num_topics", &state.topics.count().await?);
    context.insert("num_redactors", &state.redactors.count().await?);
    context.insert("num_newspapers", &state.newspapers.count().await?);
    render(&state, &page, "index.html", &context)
}
