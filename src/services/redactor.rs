//! Redactor service
//!
//! Implements account management for editorial staff:
//! - Form validation, including the password pair
//! - Username uniqueness (checked up front, backed by the unique index)
//! - Password hashing; a blank password pair on update keeps the old hash
//! - Model-level cleaning before anything is written

use crate::db::is_unique_violation;
use crate::db::repositories::{NewspaperRepository, RedactorRepository};
use crate::forms::{FormData, FormErrors, RedactorForm, RedactorFormMode};
use crate::models::{ListParams, NewRedactor, Newspaper, PagedResult, Redactor, RedactorChanges};
use crate::services::password::hash_password;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub const DUPLICATE_USERNAME_MESSAGE: &str = "A user with that username already exists.";

/// Error types for redactor service operations
#[derive(Debug, thiserror::Error)]
pub enum RedactorServiceError {
    #[error("Validation error: {0}")]
    Validation(FormErrors),

    /// Unique constraint on the username
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Redactor not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl RedactorServiceError {
    /// Field errors to show on the form, if this failure belongs on it
    pub fn form_errors(&self) -> Option<FormErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone()),
            Self::Integrity(message) => Some(FormErrors::single("username", message.clone())),
            _ => None,
        }
    }
}

/// Where the permission flags of an update come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSource {
    /// Keep the stored flags
    Keep,
    /// Read `is_staff`, `is_superuser` and `is_active` checkboxes
    Form,
}

pub struct RedactorService {
    repo: Arc<dyn RedactorRepository>,
    newspapers: Arc<dyn NewspaperRepository>,
}

impl RedactorService {
    pub fn new(repo: Arc<dyn RedactorRepository>, newspapers: Arc<dyn NewspaperRepository>) -> Self {
        Self { repo, newspapers }
    }

    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<Redactor>, RedactorServiceError> {
        Ok(self.repo.list(params).await.context("Failed to list redactors")?)
    }

    pub async fn count(&self) -> Result<i64, RedactorServiceError> {
        Ok(self.repo.count().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Redactor, RedactorServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(RedactorServiceError::NotFound(id))
    }

    /// Newspapers the redactor is listed as a publisher of
    pub async fn published(&self, id: i64) -> Result<Vec<Newspaper>, RedactorServiceError> {
        Ok(self.newspapers.list_by_publisher(id).await?)
    }

    /// Validate and create an account with default permissions
    pub async fn create(&self, data: &FormData) -> Result<Redactor, RedactorServiceError> {
        let form = RedactorForm::clean(data, RedactorFormMode::Create)
            .map_err(RedactorServiceError::Validation)?;
        self.ensure_username_free(&form.username, None).await?;

        let password = form.password.as_deref().unwrap_or_default();
        let mut new = NewRedactor::new(form.username, hash_password(password)?);
        new.first_name = form.first_name;
        new.last_name = form.last_name;
        new.email = form.email;
        new.years_of_experience = form.years_of_experience;

        self.insert(&new).await
    }

    /// Insert an already-hashed account, e.g. the bootstrap superuser
    pub async fn insert(&self, new: &NewRedactor) -> Result<Redactor, RedactorServiceError> {
        new.clean().map_err(years_error)?;
        let redactor = self.repo.create(new).await.map_err(map_write_error)?;
        info!(id = redactor.id, username = %redactor.username, "Redactor created");
        Ok(redactor)
    }

    /// Validate and update an account
    pub async fn update(
        &self,
        id: i64,
        data: &FormData,
        permissions: PermissionSource,
    ) -> Result<Redactor, RedactorServiceError> {
        let current = self.get(id).await?;
        let form = RedactorForm::clean(data, RedactorFormMode::Update)
            .map_err(RedactorServiceError::Validation)?;
        self.ensure_username_free(&form.username, Some(id)).await?;

        let mut changes = RedactorChanges::from_redactor(&current);
        changes.username = form.username;
        changes.first_name = form.first_name;
        changes.last_name = form.last_name;
        changes.email = form.email;
        changes.years_of_experience = form.years_of_experience;
        if permissions == PermissionSource::Form {
            changes.is_staff = checked(data, "is_staff");
            changes.is_superuser = checked(data, "is_superuser");
            changes.is_active = checked(data, "is_active");
        }
        if let Some(password) = &form.password {
            changes.password_hash = Some(hash_password(password)?);
        }
        changes.clean().map_err(years_error)?;

        self.repo
            .update(id, &changes)
            .await
            .map_err(map_write_error)?
            .ok_or(RedactorServiceError::NotFound(id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), RedactorServiceError> {
        if !self.repo.delete(id).await? {
            return Err(RedactorServiceError::NotFound(id));
        }
        info!(id, "Redactor deleted");
        Ok(())
    }

    async fn ensure_username_free(
        &self,
        username: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), RedactorServiceError> {
        if self.repo.exists_username(username, exclude_id).await? {
            return Err(RedactorServiceError::Integrity(
                DUPLICATE_USERNAME_MESSAGE.to_string(),
            ));
        }
        Ok(())
    }
}

fn checked(data: &FormData, field: &str) -> bool {
    matches!(data.get(field).map(str::trim), Some(v) if !matches!(v, "" | "0" | "false" | "off"))
}

fn years_error(message: String) -> RedactorServiceError {
    RedactorServiceError::Validation(FormErrors::single("years_of_experience", message))
}

fn map_write_error(err: anyhow::Error) -> RedactorServiceError {
    if is_unique_violation(&err) {
        RedactorServiceError::Integrity(DUPLICATE_USERNAME_MESSAGE.to_string())
    } else {
        RedactorServiceError::InternalError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxNewspaperRepository, SqlxRedactorRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::verify_password;

    async fn setup() -> RedactorService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        RedactorService::new(
            SqlxRedactorRepository::boxed(pool.clone()),
            SqlxNewspaperRepository::boxed(pool),
        )
    }

    fn signup(username: &str) -> FormData {
        FormData::from_pairs([
            ("username", username),
            ("first_name", "John"),
            ("last_name", "Doe"),
            ("email", "john@example.com"),
            ("years_of_experience", "5"),
            ("password1", "ComplexPassword!2345"),
            ("password2", "ComplexPassword!2345"),
        ])
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let service = setup().await;

        let redactor = service.create(&signup("john_doe")).await.unwrap();

        assert_eq!(redactor.to_string(), "john_doe (5 years of experience)");
        assert!(redactor.is_active);
        assert!(!redactor.is_staff);
        assert_ne!(redactor.password_hash, "ComplexPassword!2345");
        assert!(verify_password("ComplexPassword!2345", &redactor.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_integrity_error() {
        let service = setup().await;
        service.create(&signup("john_doe")).await.unwrap();

        let err = service.create(&signup("john_doe")).await.unwrap_err();
        assert!(matches!(err, RedactorServiceError::Integrity(_)));
        assert!(err.form_errors().unwrap().has_field("username"));
    }

    #[tokio::test]
    async fn test_update_years_keeps_password_hash() {
        let service = setup().await;
        let original = service.create(&signup("john_doe")).await.unwrap();

        let mut data = RedactorForm::initial(&original);
        data.set("years_of_experience", "10");
        data.set("password1", "");
        data.set("password2", "");
        let updated = service
            .update(original.id, &data, PermissionSource::Keep)
            .await
            .unwrap();

        assert_eq!(updated.years_of_experience, 10);
        assert_eq!(updated.password_hash, original.password_hash);
        assert_eq!(updated.username, original.username);
        assert_eq!(updated.email, original.email);
    }

    #[tokio::test]
    async fn test_update_with_new_password_replaces_hash() {
        let service = setup().await;
        let original = service.create(&signup("john_doe")).await.unwrap();

        let mut data = RedactorForm::initial(&original);
        data.set("password1", "AnotherSecret!99");
        data.set("password2", "AnotherSecret!99");
        let updated = service
            .update(original.id, &data, PermissionSource::Keep)
            .await
            .unwrap();

        assert_ne!(updated.password_hash, original.password_hash);
        assert!(verify_password("AnotherSecret!99", &updated.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_update_own_username_is_allowed() {
        let service = setup().await;
        let john = service.create(&signup("john_doe")).await.unwrap();
        service.create(&signup("jane_doe")).await.unwrap();

        let data = RedactorForm::initial(&john);
        assert!(service.update(john.id, &data, PermissionSource::Keep).await.is_ok());

        let mut data = RedactorForm::initial(&john);
        data.set("username", "jane_doe");
        let err = service
            .update(john.id, &data, PermissionSource::Keep)
            .await
            .unwrap_err();
        assert!(matches!(err, RedactorServiceError::Integrity(_)));
    }

    #[tokio::test]
    async fn test_permissions_from_form() {
        let service = setup().await;
        let john = service.create(&signup("john_doe")).await.unwrap();

        let mut data = RedactorForm::initial(&john);
        data.set("is_staff", "on");
        let kept = service
            .update(john.id, &data, PermissionSource::Keep)
            .await
            .unwrap();
        assert!(!kept.is_staff);

        let promoted = service
            .update(john.id, &data, PermissionSource::Form)
            .await
            .unwrap();
        assert!(promoted.is_staff);
        assert!(promoted.is_active);
        assert!(!promoted.is_superuser);
    }

    #[tokio::test]
    async fn test_years_out_of_range_rejected_everywhere() {
        let service = setup().await;

        let mut data = signup("john_doe");
        data.set("years_of_experience", "-1");
        assert!(matches!(
            service.create(&data).await,
            Err(RedactorServiceError::Validation(_))
        ));

        let mut new = NewRedactor::new("direct", "hash");
        new.years_of_experience = 100;
        assert!(matches!(
            service.insert(&new).await,
            Err(RedactorServiceError::Validation(ref e)) if e.has_field("years_of_experience")
        ));
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let service = setup().await;
        let john = service.create(&signup("john_doe")).await.unwrap();

        service.delete(john.id).await.unwrap();
        assert!(matches!(
            service.get(john.id).await,
            Err(RedactorServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(john.id).await,
            Err(RedactorServiceError::NotFound(_))
        ));
    }
}


