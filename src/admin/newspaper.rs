//! Newspaper admin

use super::{
    AdminModel, AdminSaveError, Cell, Column, FieldSpec, Fieldset, ListFilter, ModelAdmin, Record,
    Widget,
};
use crate::db::repositories::NewspaperRepository;
use crate::forms::{FormData, NewspaperForm};
use crate::services::{NewspaperService, NewspaperServiceError};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

const FIELDSETS: &[Fieldset] = &[Fieldset {
    title: None,
    fields: &[
        FieldSpec {
            name: "title",
            label: "Title",
            widget: Widget::Text,
            help: "",
        },
        FieldSpec {
            name: "content",
            label: "Content",
            widget: Widget::Textarea,
            help: "",
        },
        FieldSpec {
            name: "published_date",
            label: "Published date",
            widget: Widget::Date,
            help: "",
        },
        FieldSpec {
            name: "topic",
            label: "Topics",
            widget: Widget::MultiSelect {
                table: "topics",
                label_column: "name",
            },
            help: "",
        },
        FieldSpec {
            name: "publishers",
            label: "Publishers",
            widget: Widget::MultiSelect {
                table: "redactors",
                label_column: "username",
            },
            help: "",
        },
    ],
}];

pub static NEWSPAPER_ADMIN: ModelAdmin = ModelAdmin {
    name: "newspaper",
    verbose_name: "newspaper",
    verbose_name_plural: "newspapers",
    table: "newspapers",
    list_display: &[
        Column {
            field: "title",
            label: "Title",
        },
        Column {
            field: "published_date",
            label: "Published date",
        },
    ],
    search_fields: &["title", "content"],
    list_filter: &[
        ListFilter::Year {
            param: "published_date__year",
            title: "published date",
            column: "published_date",
        },
        ListFilter::ManyToMany {
            param: "topic",
            title: "topic",
            join_table: "newspaper_topics",
            owner_column: "newspaper_id",
            join_column: "topic_id",
            target_table: "topics",
            label_column: "name",
        },
        ListFilter::ManyToMany {
            param: "publishers",
            title: "publishers",
            join_table: "newspaper_publishers",
            owner_column: "newspaper_id",
            join_column: "redactor_id",
            target_table: "redactors",
            label_column: "username",
        },
    ],
    prefetch_related: &["topics", "publishers"],
    ordering: &["-id"],
    list_per_page: super::LIST_PER_PAGE,
    fieldsets: FIELDSETS,
    add_fieldsets: FIELDSETS,
};

pub struct NewspaperAdmin {
    service: Arc<NewspaperService>,
    repo: Arc<dyn NewspaperRepository>,
}

impl NewspaperAdmin {
    pub fn new(service: Arc<NewspaperService>, repo: Arc<dyn NewspaperRepository>) -> Self {
        Self { service, repo }
    }
}

fn save_error(err: NewspaperServiceError) -> AdminSaveError {
    if let Some(errors) = err.form_errors() {
        return AdminSaveError::Invalid(errors);
    }
    match err {
        NewspaperServiceError::NotFound(id) => AdminSaveError::NotFound(id),
        other => AdminSaveError::Internal(other.into()),
    }
}

#[async_trait]
impl AdminModel for NewspaperAdmin {
    fn config(&self) -> &'static ModelAdmin {
        &NEWSPAPER_ADMIN
    }

    async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    /// Prefetched relations come batched with the page, not per row
    async fn records(&self, ids: &[i64], prefetch: &[&'static str]) -> Result<Vec<Record>> {
        let newspapers = self.repo.get_by_ids(ids, prefetch).await?;
        Ok(newspapers
            .into_iter()
            .map(|n| {
                let mut record = Record::new(n.id, n.to_string()).with(
                    "published_date",
                    Cell::Text(n.published_date.format("%Y-%m-%d").to_string()),
                );
                if prefetch.contains(&"topics") {
                    let names: Vec<&str> = n.topics.iter().map(|t| t.name.as_str()).collect();
                    record = record.with("topics", Cell::Text(names.join(", ")));
                }
                if prefetch.contains(&"publishers") {
                    let names: Vec<&str> =
                        n.publishers.iter().map(|r| r.username.as_str()).collect();
                    record = record.with("publishers", Cell::Text(names.join(", ")));
                }
                record.with("title", Cell::Text(n.title))
            })
            .collect())
    }

    async fn initial(&self, id: i64) -> Result<Option<(String, FormData)>> {
        Ok(self
            .repo
            .get_by_id(id)
            .await?
            .map(|n| (n.to_string(), NewspaperForm::initial(&n))))
    }

    async fn save(&self, id: Option<i64>, data: &FormData) -> Result<i64, AdminSaveError> {
        let newspaper = match id {
            Some(id) => self.service.update(id, data).await,
            None => self.service.create(data).await,
        }
        .map_err(save_error)?;
        Ok(newspaper.id)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.service.delete(id).await {
            Ok(()) => Ok(true),
            Err(NewspaperServiceError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
