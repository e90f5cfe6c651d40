//! Redactor form
//!
//! Handles the two password fields: both are required when creating an
//! account, and on update leaving both blank keeps the current password.

use super::{Cleaner, FormData, FormErrors, Rule};
use crate::models::{Redactor, MAX_YEARS_OF_EXPERIENCE, MIN_YEARS_OF_EXPERIENCE};

pub const PASSWORD_MIN_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactorFormMode {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactorForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub years_of_experience: i32,
    /// New raw password; `None` keeps the stored hash
    pub password: Option<String>,
}

impl RedactorForm {
    pub fn clean(data: &FormData, mode: RedactorFormMode) -> Result<Self, FormErrors> {
        let mut cleaner = Cleaner::new(data);

        let username = cleaner.text(
            "username",
            &[
                Rule::Required,
                Rule::MaxLength(Redactor::USERNAME_MAX_LENGTH),
                Rule::Username,
            ],
        );
        let first_name = cleaner.text("first_name", &[Rule::MaxLength(Redactor::NAME_MAX_LENGTH)]);
        let last_name = cleaner.text("last_name", &[Rule::MaxLength(Redactor::NAME_MAX_LENGTH)]);
        let email = cleaner.text(
            "email",
            &[Rule::MaxLength(Redactor::EMAIL_MAX_LENGTH), Rule::Email],
        );
        let years_of_experience = cleaner
            .integer(
                "years_of_experience",
                &[
                    Rule::Required,
                    Rule::Range(
                        MIN_YEARS_OF_EXPERIENCE as i64,
                        MAX_YEARS_OF_EXPERIENCE as i64,
                    ),
                ],
                None,
            )
            .unwrap_or_default() as i32;

        let password = clean_passwords(&mut cleaner, &username, mode);

        cleaner.finish(Self {
            username,
            first_name,
            last_name,
            email,
            years_of_experience,
            password,
        })
    }

    /// Form values of an existing redactor; password fields stay blank
    pub fn initial(redactor: &Redactor) -> FormData {
        let years = redactor.years_of_experience.to_string();
        let mut data = FormData::from_pairs([
            ("username", redactor.username.as_str()),
            ("first_name", redactor.first_name.as_str()),
            ("last_name", redactor.last_name.as_str()),
            ("email", redactor.email.as_str()),
            ("years_of_experience", years.as_str()),
        ]);
        for (flag, on) in [
            ("is_staff", redactor.is_staff),
            ("is_superuser", redactor.is_superuser),
            ("is_active", redactor.is_active),
        ] {
            if on {
                data.set(flag, "on");
            }
        }
        data
    }
}

fn clean_passwords(
    cleaner: &mut Cleaner<'_>,
    username: &str,
    mode: RedactorFormMode,
) -> Option<String> {
    let password1 = cleaner.data().get("password1").unwrap_or("").to_string();
    let password2 = cleaner.data().get("password2").unwrap_or("").to_string();

    if mode == RedactorFormMode::Update && password1.is_empty() && password2.is_empty() {
        return None;
    }

    cleaner.raw("password1", &[Rule::Required]);
    cleaner.raw("password2", &[Rule::Required]);
    if password1.is_empty() || password2.is_empty() {
        return None;
    }

    if password1 != password2 {
        cleaner.error("password2", "The two password fields didn't match.");
        return None;
    }

    let problems = password_errors(&password1, username);
    if !problems.is_empty() {
        for problem in problems {
            cleaner.error("password2", problem);
        }
        return None;
    }

    Some(password1)
}

/// Strength problems of a password, empty when it is acceptable
pub fn password_errors(password: &str, username: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(format!(
            "This password is too short. It must contain at least {} characters.",
            PASSWORD_MIN_LENGTH
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.push("This password is entirely numeric.".to_string());
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        errors.push("The password is too similar to the username.".to_string());
    }
    errors
}
