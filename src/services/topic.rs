//! Topic service
//!
//! Validates submitted topic forms and maps the unique-name constraint to an
//! integrity error.

use crate::db::is_unique_violation;
use crate::db::repositories::TopicRepository;
use crate::forms::{FormData, FormErrors, TopicForm};
use crate::models::{ListParams, PagedResult, Topic, TopicOrdering};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub const DUPLICATE_NAME_MESSAGE: &str = "Topic with this name already exists.";

/// Error types for topic service operations
#[derive(Debug, thiserror::Error)]
pub enum TopicServiceError {
    #[error("Validation error: {0}")]
    Validation(FormErrors),

    /// Unique constraint on the name
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Topic not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl TopicServiceError {
    /// Field errors to show on the form, if this failure belongs on it
    pub fn form_errors(&self) -> Option<FormErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone()),
            Self::Integrity(message) => Some(FormErrors::single("name", message.clone())),
            _ => None,
        }
    }
}

pub struct TopicService {
    repo: Arc<dyn TopicRepository>,
}

impl TopicService {
    pub fn new(repo: Arc<dyn TopicRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        params: &ListParams,
        ordering: TopicOrdering,
    ) -> Result<PagedResult<Topic>, TopicServiceError> {
        Ok(self
            .repo
            .list(params, ordering)
            .await
            .context("Failed to list topics")?)
    }

    pub async fn count(&self) -> Result<i64, TopicServiceError> {
        Ok(self.repo.count().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Topic, TopicServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(TopicServiceError::NotFound(id))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Topic>, TopicServiceError> {
        Ok(self.repo.get_by_name(name).await?)
    }

    /// Validate and insert a topic
    pub async fn create(&self, data: &FormData) -> Result<Topic, TopicServiceError> {
        let form = TopicForm::clean(data).map_err(TopicServiceError::Validation)?;

        let topic = self.repo.create(&form.name).await.map_err(map_write_error)?;
        info!(id = topic.id, name = %topic.name, "Topic created");
        Ok(topic)
    }

    /// Validate and rename a topic
    pub async fn update(&self, id: i64, data: &FormData) -> Result<Topic, TopicServiceError> {
        let form = TopicForm::clean(data).map_err(TopicServiceError::Validation)?;

        self.repo
            .update(id, &form.name)
            .await
            .map_err(map_write_error)?
            .ok_or(TopicServiceError::NotFound(id))
    }

    /// Delete a topic; its newspaper links go with it
    pub async fn delete(&self, id: i64) -> Result<(), TopicServiceError> {
        if !self.repo.delete(id).await? {
            return Err(TopicServiceError::NotFound(id));
        }
        info!(id, "Topic deleted");
        Ok(())
    }
}

fn map_write_error(err: anyhow::Error) -> TopicServiceError {
    if is_unique_violation(&err) {
        TopicServiceError::Integrity(DUPLICATE_NAME_MESSAGE.to_string())
    } else {
        TopicServiceError::InternalError(err)
    }
}
