//! Redactor admin
//!
//! The add form asks only for the account basics plus years of experience;
//! the change form edits permissions and shows the login timestamps.

use super::{
    AdminModel, AdminSaveError, Cell, Column, FieldSpec, Fieldset, ListFilter, ModelAdmin, Record,
    Widget,
};
use crate::db::repositories::RedactorRepository;
use crate::forms::{FormData, RedactorForm};
use crate::models::Redactor;
use crate::services::{PermissionSource, RedactorService, RedactorServiceError};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const YEARS_OF_EXPERIENCE: FieldSpec = FieldSpec {
    name: "years_of_experience",
    label: "Years of experience",
    widget: Widget::Number,
    help: "",
};

pub static REDACTOR_ADMIN: ModelAdmin = ModelAdmin {
    name: "redactor",
    verbose_name: "redactor",
    verbose_name_plural: "redactors",
    table: "redactors",
    list_display: &[
        Column {
            field: "username",
            label: "Username",
        },
        Column {
            field: "email",
            label: "Email address",
        },
        Column {
            field: "first_name",
            label: "First name",
        },
        Column {
            field: "last_name",
            label: "Last name",
        },
        Column {
            field: "is_staff",
            label: "Staff status",
        },
        Column {
            field: "years_of_experience",
            label: "Years of experience",
        },
    ],
    search_fields: &["username", "first_name", "last_name", "email"],
    list_filter: &[
        ListFilter::Boolean {
            param: "is_staff",
            title: "staff status",
        },
        ListFilter::Boolean {
            param: "is_superuser",
            title: "superuser status",
        },
        ListFilter::Boolean {
            param: "is_active",
            title: "active",
        },
    ],
    prefetch_related: &[],
    ordering: &["-id"],
    list_per_page: super::LIST_PER_PAGE,
    fieldsets: &[
        Fieldset {
            title: None,
            fields: &[
                FieldSpec {
                    name: "username",
                    label: "Username",
                    widget: Widget::Text,
                    help: "Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only.",
                },
                FieldSpec {
                    name: "password1",
                    label: "New password",
                    widget: Widget::Password,
                    help: "Leave both password fields blank to keep the current password.",
                },
                FieldSpec {
                    name: "password2",
                    label: "New password confirmation",
                    widget: Widget::Password,
                    help: "",
                },
            ],
        },
        Fieldset {
            title: Some("Personal info"),
            fields: &[
                FieldSpec {
                    name: "first_name",
                    label: "First name",
                    widget: Widget::Text,
                    help: "",
                },
                FieldSpec {
                    name: "last_name",
                    label: "Last name",
                    widget: Widget::Text,
                    help: "",
                },
                FieldSpec {
                    name: "email",
                    label: "Email address",
                    widget: Widget::Email,
                    help: "",
                },
            ],
        },
        Fieldset {
            title: Some("Permissions"),
            fields: &[
                FieldSpec {
                    name: "is_active",
                    label: "Active",
                    widget: Widget::Checkbox,
                    help: "Unselect this instead of deleting accounts.",
                },
                FieldSpec {
                    name: "is_staff",
                    label: "Staff status",
                    widget: Widget::Checkbox,
                    help: "Designates whether the user can log into this admin site.",
                },
                FieldSpec {
                    name: "is_superuser",
                    label: "Superuser status",
                    widget: Widget::Checkbox,
                    help: "",
                },
            ],
        },
        Fieldset {
            title: Some("Important dates"),
            fields: &[
                FieldSpec {
                    name: "last_login",
                    label: "Last login",
                    widget: Widget::ReadOnly,
                    help: "",
                },
                FieldSpec {
                    name: "date_joined",
                    label: "Date joined",
                    widget: Widget::ReadOnly,
                    help: "",
                },
            ],
        },
        Fieldset {
            title: Some("Additional info"),
            fields: &[YEARS_OF_EXPERIENCE],
        },
    ],
    add_fieldsets: &[
        Fieldset {
            title: None,
            fields: &[
                FieldSpec {
                    name: "username",
                    label: "Username",
                    widget: Widget::Text,
                    help: "Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only.",
                },
                FieldSpec {
                    name: "password1",
                    label: "Password",
                    widget: Widget::Password,
                    help: "At least 8 characters, not entirely numeric.",
                },
                FieldSpec {
                    name: "password2",
                    label: "Password confirmation",
                    widget: Widget::Password,
                    help: "Enter the same password as before, for verification.",
                },
            ],
        },
        Fieldset {
            title: Some("Additional info"),
            fields: &[
                FieldSpec {
                    name: "first_name",
                    label: "First name",
                    widget: Widget::Text,
                    help: "",
                },
                FieldSpec {
                    name: "last_name",
                    label: "Last name",
                    widget: Widget::Text,
                    help: "",
                },
                FieldSpec {
                    name: "email",
                    label: "Email address",
                    widget: Widget::Email,
                    help: "",
                },
                YEARS_OF_EXPERIENCE,
            ],
        },
    ],
};

pub struct RedactorAdmin {
    service: Arc<RedactorService>,
    repo: Arc<dyn RedactorRepository>,
}

impl RedactorAdmin {
    pub fn new(service: Arc<RedactorService>, repo: Arc<dyn RedactorRepository>) -> Self {
        Self { service, repo }
    }
}

fn save_error(err: RedactorServiceError) -> AdminSaveError {
    if let Some(errors) = err.form_errors() {
        return AdminSaveError::Invalid(errors);
    }
    match err {
        RedactorServiceError::NotFound(id) => AdminSaveError::NotFound(id),
        other => AdminSaveError::Internal(other.into()),
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

fn change_initial(redactor: &Redactor) -> FormData {
    let mut data = RedactorForm::initial(redactor);
    data.set(
        "last_login",
        redactor
            .last_login
            .as_ref()
            .map(timestamp)
            .unwrap_or_else(|| "-".to_string()),
    );
    data.set("date_joined", timestamp(&redactor.date_joined));
    data
}

#[async_trait]
impl AdminModel for RedactorAdmin {
    fn config(&self) -> &'static ModelAdmin {
        &REDACTOR_ADMIN
    }

    async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    async fn records(&self, ids: &[i64], _prefetch: &[&'static str]) -> Result<Vec<Record>> {
        let redactors = self.repo.get_by_ids(ids).await?;
        Ok(redactors
            .into_iter()
            .map(|r| {
                Record::new(r.id, r.to_string())
                    .with("years_of_experience", Cell::Text(r.years_of_experience.to_string()))
                    .with("username", Cell::Text(r.username))
                    .with("email", Cell::Text(r.email))
                    .with("first_name", Cell::Text(r.first_name))
                    .with("last_name", Cell::Text(r.last_name))
                    .with("is_staff", Cell::Bool(r.is_staff))
                    .with("is_superuser", Cell::Bool(r.is_superuser))
                    .with("is_active", Cell::Bool(r.is_active))
            })
            .collect())
    }

    async fn initial(&self, id: i64) -> Result<Option<(String, FormData)>> {
        Ok(self
            .repo
            .get_by_id(id)
            .await?
            .map(|r| (r.to_string(), change_initial(&r))))
    }

    fn add_initial(&self) -> FormData {
        FormData::from_pairs([("years_of_experience", "0")])
    }

    async fn save(&self, id: Option<i64>, data: &FormData) -> Result<i64, AdminSaveError> {
        let redactor = match id {
            Some(id) => self.service.update(id, data, PermissionSource::Form).await,
            None => self.service.create(data).await,
        }
        .map_err(save_error)?;
        Ok(redactor.id)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.service.delete(id).await {
            Ok(()) => Ok(true),
            Err(RedactorServiceError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
