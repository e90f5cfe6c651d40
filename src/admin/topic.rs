//! Topic admin

use super::{
    AdminModel, AdminSaveError, Cell, Column, FieldSpec, Fieldset, ModelAdmin, Record, Widget,
};
use crate::db::repositories::TopicRepository;
use crate::forms::{FormData, TopicForm};
use crate::services::{TopicService, TopicServiceError};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

const FIELDSETS: &[Fieldset] = &[Fieldset {
    title: None,
    fields: &[FieldSpec {
        name: "name",
        label: "Name",
        widget: Widget::Text,
        help: "",
    }],
}];

pub static TOPIC_ADMIN: ModelAdmin = ModelAdmin {
    name: "topic",
    verbose_name: "topic",
    verbose_name_plural: "topics",
    table: "topics",
    list_display: &[Column {
        field: "name",
        label: "Name",
    }],
    search_fields: &["name"],
    list_filter: &[],
    prefetch_related: &[],
    ordering: &["-id"],
    list_per_page: super::LIST_PER_PAGE,
    fieldsets: FIELDSETS,
    add_fieldsets: FIELDSETS,
};

pub struct TopicAdmin {
    service: Arc<TopicService>,
    repo: Arc<dyn TopicRepository>,
}

impl TopicAdmin {
    pub fn new(service: Arc<TopicService>, repo: Arc<dyn TopicRepository>) -> Self {
        Self { service, repo }
    }
}

fn save_error(err: TopicServiceError) -> AdminSaveError {
    if let Some(errors) = err.form_errors() {
        return AdminSaveError::Invalid(errors);
    }
    match err {
        TopicServiceError::NotFound(id) => AdminSaveError::NotFound(id),
        other => AdminSaveError::Internal(other.into()),
    }
}

#[async_trait]
impl AdminModel for TopicAdmin {
    fn config(&self) -> &'static ModelAdmin {
        &TOPIC_ADMIN
    }

    async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    async fn records(&self, ids: &[i64], _prefetch: &[&'static str]) -> Result<Vec<Record>> {
        let topics = self.repo.get_by_ids(ids).await?;
        Ok(topics
            .into_iter()
            .map(|topic| {
                Record::new(topic.id, topic.to_string()).with("name", Cell::Text(topic.name))
            })
            .collect())
    }

    async fn initial(&self, id: i64) -> Result<Option<(String, FormData)>> {
        Ok(self
            .repo
            .get_by_id(id)
            .await?
            .map(|topic| (topic.to_string(), TopicForm::initial(&topic))))
    }

    async fn save(&self, id: Option<i64>, data: &FormData) -> Result<i64, AdminSaveError> {
        let topic = match id {
            Some(id) => self.service.update(id, data).await,
            None => self.service.create(data).await,
        }
        .map_err(save_error)?;
        Ok(topic.id)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.service.delete(id).await {
            Ok(()) => Ok(true),
            Err(TopicServiceError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
