//! Admin back-office pages
//!
//! Every model is served by the same handlers; the registered
//! [`ModelAdmin`](crate::admin::ModelAdmin) entry decides columns, filters and forms.

use axum::extract::{Query, State};
use axum::Form;
use std::sync::Arc;
use tera::Context as TeraContext;

use super::common::{found, render, ObjectPath, Page, WebResult};
use super::{AppState, WebError};
use crate::admin::{AdminModel, AdminSaveError, Fieldset, Widget};
use crate::forms::{FormData, FormErrors};
use crate::view::PageContext;

fn model(state: &AppState, name: &str) -> Result<Arc<dyn AdminModel>, WebError> {
    state.admin.get(name).ok_or(WebError::NotFound)
}

fn changelist_url(model: &dyn AdminModel) -> String {
    format!("/admin/{}/", model.config().name)
}

pub async fn index(State(state): State<AppState>, Page(page): Page) -> WebResult {
    let mut context = TeraContext::new();
    context.insert("entries", &state.admin.index().await?);
    render(&state, &page, "admin/index.html", &context)
}

pub async fn changelist(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(name): ObjectPath<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> WebResult {
    let model = model(&state, &name)?;
    let query = FormData::from(pairs);
    let cl = state.admin.changelist(model.as_ref(), &query).await?;
    if cl.out_of_range {
        return Err(WebError::NotFound);
    }

    let mut context = TeraContext::new();
    context.insert("model", model.config());
    context.insert("cl", &cl);
    render(&state, &page, "admin/change_list.html", &context)
}

struct FormPage<'a> {
    model: &'a dyn AdminModel,
    fieldsets: &'static [Fieldset],
    object: Option<(i64, String)>,
    data: &'a FormData,
    errors: &'a FormErrors,
}

async fn form_page(state: &AppState, page: &PageContext, form: FormPage<'_>) -> WebResult {
    let fieldsets = state
        .admin
        .bind(form.fieldsets, form.data, form.errors)
        .await?;

    let mut context = TeraContext::new();
    context.insert("model", form.model.config());
    context.insert("fieldsets", &fieldsets);
    context.insert("errors", form.errors);
    context.insert("object_id", &form.object.as_ref().map(|(id, _)| *id));
    context.insert("object_repr", &form.object.as_ref().map(|(_, repr)| repr));
    render(state, page, "admin/change_form.html", &context)
}

pub async fn add_form(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(name): ObjectPath<String>,
) -> WebResult {
    let model = model(&state, &name)?;
    let data = model.add_initial();
    let form = FormPage {
        model: model.as_ref(),
        fieldsets: model.config().add_fieldsets,
        object: None,
        data: &data,
        errors: &FormErrors::default(),
    };
    form_page(&state, &page, form).await
}

pub async fn add(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath(name): ObjectPath<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let model = model(&state, &name)?;
    let data = FormData::from(pairs);
    match model.save(None, &data).await {
        Ok(id) => {
            tracing::info!(model = %name, id, "Admin object added");
            Ok(found(&changelist_url(model.as_ref())))
        }
        Err(AdminSaveError::Invalid(errors)) => {
            let form = FormPage {
                model: model.as_ref(),
                fieldsets: model.config().add_fieldsets,
                object: None,
                data: &data,
                errors: &errors,
            };
            form_page(&state, &page, form).await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn change_form(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath((name, id)): ObjectPath<(String, i64)>,
) -> WebResult {
    let model = model(&state, &name)?;
    let (repr, data) = model.initial(id).await?.ok_or(WebError::NotFound)?;
    let form = FormPage {
        model: model.as_ref(),
        fieldsets: model.config().fieldsets,
        object: Some((id, repr)),
        data: &data,
        errors: &FormErrors::default(),
    };
    form_page(&state, &page, form).await
}

/// Posted values plus the read-only values a browser never submits
fn with_read_only(fieldsets: &[Fieldset], mut posted: FormData, stored: &FormData) -> FormData {
    for spec in fieldsets.iter().flat_map(|fs| fs.fields.iter()) {
        if matches!(spec.widget, Widget::ReadOnly) {
            if let Some(value) = stored.get(spec.name) {
                posted.set(spec.name, value);
            }
        }
    }
    posted
}

pub async fn change(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath((name, id)): ObjectPath<(String, i64)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> WebResult {
    let model = model(&state, &name)?;
    let (repr, stored) = model.initial(id).await?.ok_or(WebError::NotFound)?;
    let data = FormData::from(pairs);
    match model.save(Some(id), &data).await {
        Ok(_) => {
            tracing::info!(model = %name, id, "Admin object changed");
            Ok(found(&changelist_url(model.as_ref())))
        }
        Err(AdminSaveError::Invalid(errors)) => {
            let fieldsets = model.config().fieldsets;
            let data = with_read_only(fieldsets, data, &stored);
            let form = FormPage {
                model: model.as_ref(),
                fieldsets,
                object: Some((id, repr)),
                data: &data,
                errors: &errors,
            };
            form_page(&state, &page, form).await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Page(page): Page,
    ObjectPath((name, id)): ObjectPath<(String, i64)>,
) -> WebResult {
    let model = model(&state, &name)?;
    let (repr, _) = model.initial(id).await?.ok_or(WebError::NotFound)?;

    let mut context = TeraContext::new();
    context.insert("model", model.config());
    context.insert("object_id", &id);
    context.insert("object_repr", &repr);
    render(&state, &page, "admin/delete_confirmation.html", &context)
}

pub async fn delete(
    State(state): State<AppState>,
    ObjectPath((name, id)): ObjectPath<(String, i64)>,
) -> WebResult {
    let model = model(&state, &name)?;
    if !model.delete(id).await? {
        return Err(WebError::NotFound);
    }
    tracing::info!(model = %name, id, "Admin object deleted");
    Ok(found(&changelist_url(model.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::REDACTOR_ADMIN;

    #[test]
    fn test_read_only_values_restored() {
        let posted = FormData::from_pairs([("username", "ed"), ("last_login", "forged")]);
        let stored = FormData::from_pairs([
            ("username", "old"),
            ("last_login", "2024-01-01 10:00"),
            ("date_joined", "2023-01-01 09:00"),
        ]);

        let merged = with_read_only(REDACTOR_ADMIN.fieldsets, posted, &stored);
        assert_eq!(merged.get("username"), Some("ed"));
        assert_eq!(merged.get("last_login"), Some("2024-01-01 10:00"));
        assert_eq!(merged.get("date_joined"), Some("2023-01-01 09:00"));
    }
}
