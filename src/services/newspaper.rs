//! Newspaper service

use crate::db::repositories::{NewspaperRepository, RedactorRepository, TopicRepository};
use crate::forms::{FormData, FormErrors, NewspaperForm};
use crate::models::{ListParams, Newspaper, NewspaperInput, PagedResult};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

/// Error types for newspaper service operations
#[derive(Debug, thiserror::Error)]
pub enum NewspaperServiceError {
    #[error("Validation error: {0}")]
    Validation(FormErrors),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Newspaper not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl NewspaperServiceError {
    /// Field errors to show on the form, if this failure belongs on it
    pub fn form_errors(&self) -> Option<FormErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone()),
            Self::Integrity(message) => {
                let mut errors = FormErrors::new();
                errors.add_non_field(message.clone());
                Some(errors)
            }
            _ => None,
        }
    }
}

pub struct NewspaperService {
    repo: Arc<dyn NewspaperRepository>,
    topics: Arc<dyn TopicRepository>,
    redactors: Arc<dyn RedactorRepository>,
}

impl NewspaperService {
    pub fn new(
        repo: Arc<dyn NewspaperRepository>,
        topics: Arc<dyn TopicRepository>,
        redactors: Arc<dyn RedactorRepository>,
    ) -> Self {
        Self {
            repo,
            topics,
            redactors,
        }
    }

    /// One page of newspapers, optionally narrowed by a title fragment
    pub async fn list(
        &self,
        params: &ListParams,
        title: Option<&str>,
    ) -> Result<PagedResult<Newspaper>, NewspaperServiceError> {
        Ok(self
            .repo
            .list(params, title)
            .await
            .context("Failed to list newspapers")?)
    }

    pub async fn count(&self) -> Result<i64, NewspaperServiceError> {
        Ok(self.repo.count().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Newspaper, NewspaperServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(NewspaperServiceError::NotFound(id))
    }

    pub async fn create(&self, data: &FormData) -> Result<Newspaper, NewspaperServiceError> {
        let input = self.clean(data).await?;
        let newspaper = self.repo.create(&input).await?;
        info!(id = newspaper.id, title = %newspaper.title, "Newspaper created");
        Ok(newspaper)
    }

    /// Replace the fields and both relation sets
    pub async fn update(&self, id: i64, data: &FormData) -> Result<Newspaper, NewspaperServiceError> {
        let input = self.clean(data).await?;
        self.repo
            .update(id, &input)
            .await?
            .ok_or(NewspaperServiceError::NotFound(id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), NewspaperServiceError> {
        if !self.repo.delete(id).await? {
            return Err(NewspaperServiceError::NotFound(id));
        }
        info!(id, "Newspaper deleted");
        Ok(())
    }

    /// Run the form and check that every selected topic and publisher exists
    async fn clean(&self, data: &FormData) -> Result<NewspaperInput, NewspaperServiceError> {
        let form = NewspaperForm::clean(data).map_err(NewspaperServiceError::Validation)?;

        let mut errors = FormErrors::new();
        let known_topics: Vec<i64> = self
            .topics
            .get_by_ids(&form.topic_ids)
            .await?
            .iter()
            .map(|t| t.id)
            .collect();
        for id in form.topic_ids.iter().filter(|id| !known_topics.contains(id)) {
            errors.add("topic", invalid_choice(*id));
        }

        let known_publishers: Vec<i64> = self
            .redactors
            .get_by_ids(&form.publisher_ids)
            .await?
            .iter()
            .map(|r| r.id)
            .collect();
        for id in form.publisher_ids.iter().filter(|id| !known_publishers.contains(id)) {
            errors.add("publishers", invalid_choice(*id));
        }

        if !errors.is_empty() {
            return Err(NewspaperServiceError::Validation(errors));
        }
        Ok(form.into_input())
    }
}

fn invalid_choice(id: i64) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxNewspaperRepository, SqlxRedactorRepository, SqlxTopicRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::NewRedactor;

    struct Fixture {
        service: NewspaperService,
        topics: Arc<dyn TopicRepository>,
        redactors: Arc<dyn RedactorRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let topics = SqlxTopicRepository::boxed(pool.clone());
        let redactors = SqlxRedactorRepository::boxed(pool.clone());
        Fixture {
            service: NewspaperService::new(
                SqlxNewspaperRepository::boxed(pool),
                topics.clone(),
                redactors.clone(),
            ),
            topics,
            redactors,
        }
    }

    fn article(title: &str, topic: &str, publisher: &str) -> FormData {
        FormData::from_pairs([
            ("title", title),
            ("content", "Body text"),
            ("published_date", "2024-01-15"),
            ("topic", topic),
            ("publishers", publisher),
        ])
    }

    #[tokio::test]
    async fn test_create_with_relations() {
        let f = setup().await;
        let topic = f.topics.create("Science").await.unwrap();
        let author = f.redactors.create(&NewRedactor::new("author", "hash")).await.unwrap();

        let newspaper = f
            .service
            .create(&article("Moon landing", &topic.id.to_string(), &author.id.to_string()))
            .await
            .unwrap();

        assert_eq!(newspaper.to_string(), "Moon landing");
        assert_eq!(newspaper.topic_ids(), vec![topic.id]);
        assert_eq!(newspaper.publisher_ids(), vec![author.id]);
    }

    #[tokio::test]
    async fn test_unknown_relation_ids_are_validation_errors() {
        let f = setup().await;

        let err = f.service.create(&article("Ghost", "41", "42")).await.unwrap_err();

        match err {
            NewspaperServiceError::Validation(errors) => {
                assert!(errors.field("topic")[0].contains("41"));
                assert!(errors.field("publishers")[0].contains("42"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(f.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_topic_keeps_newspaper() {
        let f = setup().await;
        let topic = f.topics.create("Science").await.unwrap();
        let author = f.redactors.create(&NewRedactor::new("author", "hash")).await.unwrap();
        let newspaper = f
            .service
            .create(&article("Moon landing", &topic.id.to_string(), &author.id.to_string()))
            .await
            .unwrap();

        f.topics.delete(topic.id).await.unwrap();
        let after = f.service.get(newspaper.id).await.unwrap();

        assert!(after.topics.is_empty());
        assert_eq!(after.title, newspaper.title);
        assert_eq!(after.content, newspaper.content);
        assert_eq!(after.published_date, newspaper.published_date);
        assert_eq!(after.publisher_ids(), vec![author.id]);
    }

    #[tokio::test]
    async fn test_list_filters_by_title() {
        let f = setup().await;
        for title in ["Morning Post", "Evening Post", "Weekly Digest"] {
            f.service.create(&article(title, "", "")).await.unwrap();
        }

        let page = f
            .service
            .list(&ListParams::default(), Some("post"))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|n| n.title.contains("Post")));
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown() {
        let f = setup().await;
        assert!(matches!(
            f.service.update(5, &article("X", "", "")).await,
            Err(NewspaperServiceError::NotFound(5))
        ));
        assert!(matches!(
            f.service.delete(5).await,
            Err(NewspaperServiceError::NotFound(5))
        ));
    }
}
