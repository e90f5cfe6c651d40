//! Authentication service
//!
//! Login, logout and session validation for redactors, plus creation of the
//! bootstrap superuser from configuration.
//!
//! Sessions live in the database and are identified by a random UUID token.
//! Expired sessions are treated as anonymous and removed when next seen.

use crate::config::BootstrapAdmin;
use crate::db::repositories::{RedactorRepository, SessionRepository};
use crate::forms::{FormData, RedactorForm, RedactorFormMode};
use crate::models::{NewRedactor, Redactor, Session};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default session expiration time in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

pub const INVALID_LOGIN_MESSAGE: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Invalid credentials or inactive account
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct AuthService {
    redactors: Arc<dyn RedactorRepository>,
    sessions: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl AuthService {
    pub fn new(
        redactors: Arc<dyn RedactorRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(redactors, sessions, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    pub fn with_session_expiration(
        redactors: Arc<dyn RedactorRepository>,
        sessions: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            redactors,
            sessions,
            session_expiration_days,
        }
    }

    /// Session lifetime in seconds, for the cookie's `Max-Age`
    pub fn session_max_age(&self) -> i64 {
        Duration::days(self.session_expiration_days).num_seconds()
    }

    /// Check credentials and open a new session
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(Redactor, Session), AuthServiceError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Please enter a username and password.".to_string(),
            ));
        }

        let redactor = match self
            .redactors
            .get_by_username(username)
            .await
            .context("Failed to get redactor by username")?
        {
            Some(redactor) => redactor,
            None => {
                warn!(username, "Login failed: unknown username");
                return Err(invalid_login());
            }
        };

        if !verify_password(password, &redactor.password_hash)? {
            warn!(username, "Login failed: wrong password");
            return Err(invalid_login());
        }
        if !redactor.is_active {
            warn!(username, "Login failed: inactive account");
            return Err(invalid_login());
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            redactor_id: redactor.id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };
        self.sessions
            .create(&session)
            .await
            .context("Failed to create session")?;
        self.redactors
            .update_last_login(redactor.id, now)
            .await
            .context("Failed to update last login")?;

        info!(redactor_id = redactor.id, "Redactor logged in");
        Ok((redactor, session))
    }

    /// End a session; unknown tokens are ignored
    pub async fn logout(&self, token: &str) -> Result<(), AuthServiceError> {
        self.sessions
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// The active redactor behind a session token, if any
    pub async fn validate_session(&self, token: &str) -> Result<Option<Redactor>, AuthServiceError> {
        let session = match self
            .sessions
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            debug!(redactor_id = session.redactor_id, "Dropping expired session");
            self.sessions
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let redactor = self
            .redactors
            .get_by_id(session.redactor_id)
            .await
            .context("Failed to get redactor")?;

        Ok(redactor.filter(|r| r.is_active))
    }

    /// Remove every expired session, returning how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthServiceError> {
        Ok(self
            .sessions
            .delete_expired()
            .await
            .context("Failed to clean up sessions")?)
    }

    /// Create the configured superuser unless that username already exists
    ///
    /// The credentials pass the same username, password and model checks as
    /// an account created through the forms.
    pub async fn ensure_bootstrap_admin(
        &self,
        admin: &BootstrapAdmin,
    ) -> Result<bool, AuthServiceError> {
        let data = FormData::from_pairs([
            ("username", admin.username.as_str()),
            ("password1", admin.password.as_str()),
            ("password2", admin.password.as_str()),
            ("email", admin.email.as_str()),
            ("years_of_experience", "0"),
        ]);
        let form = RedactorForm::clean(&data, RedactorFormMode::Create).map_err(|errors| {
            AuthServiceError::ValidationError(format!("Invalid bootstrap admin: {}", errors))
        })?;

        if self
            .redactors
            .get_by_username(&form.username)
            .await
            .context("Failed to look up bootstrap admin")?
            .is_some()
        {
            return Ok(false);
        }

        let password = form.password.as_deref().unwrap_or_default();
        let mut new = NewRedactor::new(form.username, hash_password(password)?);
        new.email = form.email;
        new.is_staff = true;
        new.is_superuser = true;
        new.clean().map_err(AuthServiceError::ValidationError)?;
        self.redactors
            .create(&new)
            .await
            .context("Failed to create bootstrap admin")?;

        info!(username = %new.username, "Bootstrap admin created");
        Ok(true)
    }
}

fn invalid_login() -> AuthServiceError {
    AuthServiceError::AuthenticationError(INVALID_LOGIN_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxRedactorRepository, SqlxSessionRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::RedactorChanges;

    struct Fixture {
        service: AuthService,
        redactors: Arc<dyn RedactorRepository>,
        sessions: Arc<dyn SessionRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let redactors = SqlxRedactorRepository::boxed(pool.clone());
        let sessions = SqlxSessionRepository::boxed(pool);
        Fixture {
            service: AuthService::new(redactors.clone(), sessions.clone()),
            redactors,
            sessions,
        }
    }

    async fn create_redactor(f: &Fixture, username: &str, password: &str) -> Redactor {
        f.redactors
            .create(&NewRedactor::new(username, hash_password(password).unwrap()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_creates_session() {
        let f = setup().await;
        let jane = create_redactor(&f, "jane", "ComplexPassword!2345").await;

        let (redactor, session) = f.service.login("jane", "ComplexPassword!2345").await.unwrap();

        assert_eq!(redactor.id, jane.id);
        assert_eq!(session.redactor_id, jane.id);
        let current = f.service.validate_session(&session.id).await.unwrap().unwrap();
        assert_eq!(current.id, jane.id);
        assert!(current.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let f = setup().await;
        create_redactor(&f, "jane", "ComplexPassword!2345").await;

        assert!(matches!(
            f.service.login("jane", "wrong").await,
            Err(AuthServiceError::AuthenticationError(_))
        ));
        assert!(matches!(
            f.service.login("nobody", "ComplexPassword!2345").await,
            Err(AuthServiceError::AuthenticationError(_))
        ));
        assert!(matches!(
            f.service.login("", "").await,
            Err(AuthServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_inactive_account_cannot_log_in() {
        let f = setup().await;
        let jane = create_redactor(&f, "jane", "ComplexPassword!2345").await;
        let mut changes = RedactorChanges::from_redactor(&jane);
        changes.is_active = false;
        f.redactors.update(jane.id, &changes).await.unwrap();

        assert!(matches!(
            f.service.login("jane", "ComplexPassword!2345").await,
            Err(AuthServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous_and_removed() {
        let f = setup().await;
        let jane = create_redactor(&f, "jane", "ComplexPassword!2345").await;
        let now = Utc::now();
        let session = Session {
            id: "expired-token".to_string(),
            redactor_id: jane.id,
            expires_at: now - Duration::hours(1),
            created_at: now - Duration::days(8),
        };
        f.sessions.create(&session).await.unwrap();

        assert!(f.service.validate_session("expired-token").await.unwrap().is_none());
        assert!(f.sessions.get_by_id("expired-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let f = setup().await;
        create_redactor(&f, "jane", "ComplexPassword!2345").await;
        let (_, session) = f.service.login("jane", "ComplexPassword!2345").await.unwrap();

        f.service.logout(&session.id).await.unwrap();

        assert!(f.service.validate_session(&session.id).await.unwrap().is_none());
        assert!(f.service.logout("unknown").await.is_ok());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_created_once() {
        let f = setup().await;
        let admin = BootstrapAdmin {
            username: "admin".to_string(),
            password: "ComplexPassword!2345".to_string(),
            email: "admin@example.com".to_string(),
        };

        assert!(f.service.ensure_bootstrap_admin(&admin).await.unwrap());
        assert!(!f.service.ensure_bootstrap_admin(&admin).await.unwrap());

        let stored = f.redactors.get_by_username("admin").await.unwrap().unwrap();
        assert!(stored.is_staff);
        assert!(stored.is_superuser);
        assert!(f.service.login("admin", "ComplexPassword!2345").await.is_ok());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_runs_account_rules() {
        let f = setup().await;
        for (username, password) in [
            ("admin", "1234"),
            ("admin", "12345678901"),
            ("admin", "admin"),
            ("chief editor", "ComplexPassword!2345"),
            ("", "ComplexPassword!2345"),
        ] {
            let admin = BootstrapAdmin {
                username: username.to_string(),
                password: password.to_string(),
                email: String::new(),
            };
            assert!(
                matches!(
                    f.service.ensure_bootstrap_admin(&admin).await,
                    Err(AuthServiceError::ValidationError(_))
                ),
                "{:?}",
                (username, password)
            );
        }

        let bad_email = BootstrapAdmin {
            username: "admin".to_string(),
            password: "ComplexPassword!2345".to_string(),
            email: "not-an-email".to_string(),
        };
        assert!(f.service.ensure_bootstrap_admin(&bad_email).await.is_err());
        assert!(f.redactors.get_by_username("admin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_max_age() {
        let f = setup().await;
        assert_eq!(f.service.session_max_age(), 7 * 24 * 60 * 60);

        let short = AuthService::with_session_expiration(f.redactors, f.sessions, 1);
        assert_eq!(short.session_max_age(), 86_400);
    }
}
