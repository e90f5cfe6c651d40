//! Web layer - HTTP handlers and routing
//!
//! Server-rendered pages for the newsroom:
//! - Dashboard with entity counts
//! - Topic, redactor and newspaper CRUD pages (login required)
//! - Login and logout
//! - The admin back-office under `/admin/` (staff only)
//! - Embedded static assets under `/static/`

pub mod admin;
pub mod auth;
pub mod common;
pub mod dashboard;
pub mod middleware;
pub mod newspapers;
pub mod redactors;
pub mod static_files;
pub mod topics;

#[cfg(test)]
mod tests;

use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::admin::{AdminSite, NewspaperAdmin, RedactorAdmin, TopicAdmin};
use crate::config::AuthConfig;
use crate::db::repositories::{
    AdminQueryRepository, SqlxAdminQueryRepository, SqlxNewspaperRepository,
    SqlxRedactorRepository, SqlxSessionRepository, SqlxTopicRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{AuthService, NewspaperService, RedactorService, TopicService};
use crate::view::TemplateEngine;

pub use common::WebError;
pub use middleware::CurrentRedactor;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub topics: Arc<TopicService>,
    pub redactors: Arc<RedactorService>,
    pub newspapers: Arc<NewspaperService>,
    pub auth: Arc<AuthService>,
    pub admin: Arc<AdminSite>,
    /// Choice lists for multi-select widgets
    pub choices: Arc<dyn AdminQueryRepository>,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    /// Wire repositories, services and the admin site over one pool
    pub fn new(pool: DynDatabasePool, templates: TemplateEngine, auth_config: &AuthConfig) -> Self {
        let topic_repo = SqlxTopicRepository::boxed(pool.clone());
        let redactor_repo = SqlxRedactorRepository::boxed(pool.clone());
        let newspaper_repo = SqlxNewspaperRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let queries = SqlxAdminQueryRepository::boxed(pool.clone());

        let topics = Arc::new(TopicService::new(topic_repo.clone()));
        let redactors = Arc::new(RedactorService::new(
            redactor_repo.clone(),
            newspaper_repo.clone(),
        ));
        let newspapers = Arc::new(NewspaperService::new(
            newspaper_repo.clone(),
            topic_repo.clone(),
            redactor_repo.clone(),
        ));
        let auth = Arc::new(AuthService::with_session_expiration(
            redactor_repo.clone(),
            session_repo,
            auth_config.session_days,
        ));

        let mut site = AdminSite::new(queries.clone());
        site.register(Arc::new(TopicAdmin::new(topics.clone(), topic_repo)));
        site.register(Arc::new(RedactorAdmin::new(redactors.clone(), redactor_repo)));
        site.register(Arc::new(NewspaperAdmin::new(newspapers.clone(), newspaper_repo)));

        Self {
            pool,
            topics,
            redactors,
            newspapers,
            auth,
            admin: Arc::new(site),
            choices: queries,
            templates: Arc::new(templates),
        }
    }
}

/// CRUD pages; every route needs a signed-in redactor
fn crud_router() -> Router<AppState> {
    Router::new()
        .route("/topics/", get(topics::list).fallback(common::method_not_allowed))
        .route("/topics/create/", get(topics::create_form).post(topics::create))
        .route("/topics/{id}/update/", get(topics::update_form).post(topics::update))
        .route("/topics/{id}/delete/", get(topics::delete_confirm).post(topics::delete))
        .route("/redactors/", get(redactors::list).fallback(common::method_not_allowed))
        .route("/redactors/create/", get(redactors::create_form).post(redactors::create))
        .route("/redactors/{id}/", get(redactors::detail))
        .route("/redactors/{id}/update/", get(redactors::update_form).post(redactors::update))
        .route("/redactors/{id}/delete/", get(redactors::delete_confirm).post(redactors::delete))
        .route("/newspapers/", get(newspapers::list).fallback(common::method_not_allowed))
        .route("/newspapers/create/", get(newspapers::create_form).post(newspapers::create))
        .route("/newspapers/{id}/", get(newspapers::detail))
        .route("/newspapers/{id}/update/", get(newspapers::update_form).post(newspapers::update))
        .route("/newspapers/{id}/delete/", get(newspapers::delete_confirm).post(newspapers::delete))
        .route_layer(axum_middleware::from_fn(middleware::require_login))
}

/// Back-office; staff only
fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(admin::index))
        .route("/admin/{model}/", get(admin::changelist))
        .route("/admin/{model}/add/", get(admin::add_form).post(admin::add))
        .route("/admin/{model}/{id}/change/", get(admin::change_form).post(admin::change))
        .route("/admin/{model}/{id}/delete/", get(admin::delete_confirm).post(admin::delete))
        .route_layer(axum_middleware::from_fn(middleware::require_staff))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/accounts/login/", get(auth::login_form).post(auth::login))
        .route("/accounts/logout/", axum::routing::post(auth::logout))
        .route("/static/{*path}", get(static_files::serve_asset))
        .merge(crud_router())
        .merge(admin_router())
        .fallback(common::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::error_pages,
        ))
        // Session lookup runs before everything else so every page knows its viewer
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_session,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
