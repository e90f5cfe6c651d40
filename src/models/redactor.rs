//! Redactor model
//!
//! A redactor is an editorial staff member and also the account that logs in.
//! The authentication fields (`is_staff`, `is_superuser`, `is_active`,
//! `last_login`, `date_joined`) follow the usual web-framework user layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted `years_of_experience`
pub const MIN_YEARS_OF_EXPERIENCE: i32 = 0;
/// Highest accepted `years_of_experience`
pub const MAX_YEARS_OF_EXPERIENCE: i32 = 60;

/// Editorial staff account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redactor {
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// May enter the admin site
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Inactive accounts cannot log in
    pub is_active: bool,
    pub years_of_experience: i32,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Redactor {
    pub const USERNAME_MAX_LENGTH: usize = 150;
    pub const NAME_MAX_LENGTH: usize = 150;
    pub const EMAIL_MAX_LENGTH: usize = 254;

    /// Model-level validation of the stored values
    pub fn clean(&self) -> Result<(), String> {
        check_years_of_experience(self.years_of_experience)
    }
}

impl fmt::Display for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} years of experience)",
            self.username, self.years_of_experience
        )
    }
}

/// Reject experience values outside the accepted range
pub fn check_years_of_experience(years: i32) -> Result<(), String> {
    if !(MIN_YEARS_OF_EXPERIENCE..=MAX_YEARS_OF_EXPERIENCE).contains(&years) {
        return Err(format!(
            "Ensure this value is between {} and {}.",
            MIN_YEARS_OF_EXPERIENCE, MAX_YEARS_OF_EXPERIENCE
        ));
    }
    Ok(())
}

/// Values for inserting a redactor; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewRedactor {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub years_of_experience: i32,
}

impl NewRedactor {
    /// A plain, active, non-staff account
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            years_of_experience: 0,
        }
    }

    pub fn clean(&self) -> Result<(), String> {
        check_years_of_experience(self.years_of_experience)
    }
}

/// Values for updating a redactor
///
/// `password_hash` is `None` when the stored hash must be kept.
#[derive(Debug, Clone)]
pub struct RedactorChanges {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub years_of_experience: i32,
    pub password_hash: Option<String>,
}

impl RedactorChanges {
    /// Start from the current values of a redactor
    pub fn from_redactor(redactor: &Redactor) -> Self {
        Self {
            username: redactor.username.clone(),
            first_name: redactor.first_name.clone(),
            last_name: redactor.last_name.clone(),
            email: redactor.email.clone(),
            is_staff: redactor.is_staff,
            is_superuser: redactor.is_superuser,
            is_active: redactor.is_active,
            years_of_experience: redactor.years_of_experience,
            password_hash: None,
        }
    }

    pub fn clean(&self) -> Result<(), String> {
        check_years_of_experience(self.years_of_experience)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(username: &str, years: i32) -> Redactor {
        Redactor {
            id: 1,
            username: username.to_string(),
            password_hash: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            years_of_experience: years,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_redactor_display() {
        assert_eq!(
            sample("john_doe", 5).to_string(),
            "john_doe (5 years of experience)"
        );
    }

    #[test]
    fn test_years_of_experience_bounds() {
        assert!(sample("a", -1).clean().is_err());
        assert!(sample("a", 100).clean().is_err());
        assert!(sample("a", 0).clean().is_ok());
        assert!(sample("a", 60).clean().is_ok());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample("jd", 1)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "jd");
    }
}
