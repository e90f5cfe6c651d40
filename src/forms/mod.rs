//! Form validation pipeline
//!
//! Request bodies and query strings arrive as urlencoded pairs through axum's
//! `Form` and `Query` extractors and are collected into [`FormData`]. A [`Cleaner`]
//! then runs the ordered [`Rule`]s of every field, turns the text into typed
//! values and collects every failure into one [`FormErrors`] report. Nothing
//! is persisted unless that report is empty.
//!
//! ```ignore
//! let data = FormData::from_pairs([("name", "Economy")]);
//! let mut cleaner = Cleaner::new(&data);
//! let name = cleaner.text("name", &[Rule::Required, Rule::MaxLength(255)]);
//! let form = cleaner.finish(TopicForm { name })?;
//! ```

mod newspaper;
mod redactor;
mod topic;

pub use newspaper::{NewspaperForm, NewspaperSearchForm};
pub use redactor::{password_errors, RedactorForm, RedactorFormMode};
pub use topic::TopicForm;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("EMAIL_RE: invalid regex pattern")
});

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("USERNAME_RE: invalid regex pattern"));

pub const REQUIRED_MESSAGE: &str = "This field is required.";

// ============================================================================
// Submitted data
// ============================================================================

/// Multi-valued field map parsed from `application/x-www-form-urlencoded`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from literal pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut data = Self::new();
        for (name, value) in pairs {
            data.append(name, value);
        }
        data
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    /// Replace every value of a field
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), vec![value.into()]);
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.remove(name);
    }

    /// First value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a field, in submission order
    pub fn get_all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// First value of every field, for pre-filling templates
    pub fn values(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(name, values)| values.first().map(|v| (name.clone(), v.clone())))
            .collect()
    }

    /// Encode back into a query string
    pub fn to_query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        let pairs: Vec<(&str, &str)> = self
            .fields
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
            .collect();
        serde_urlencoded::to_string(pairs)
    }
}

/// Pairs as decoded by `axum::Form` / `axum::extract::Query`, repeated names kept
impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut data = Self::new();
        for (name, value) in pairs {
            data.append(name, value);
        }
        data
    }
}

// ============================================================================
// Error report
// ============================================================================

/// Every validation failure of one submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A report holding a single field error
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        parts.extend(self.non_field.iter().cloned());
        write!(f, "{}", parts.join("; "))
    }
}

// ============================================================================
// Field rules
// ============================================================================

/// One check in a field's ordered validator list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MaxLength(usize),
    MinLength(usize),
    Email,
    Username,
    /// Inclusive integer bounds
    Range(i64, i64),
    NotNumeric,
}

impl Rule {
    pub fn check(&self, value: &str) -> Result<(), String> {
        match *self {
            Rule::Required => {
                if value.is_empty() {
                    return Err(REQUIRED_MESSAGE.to_string());
                }
            }
            Rule::MaxLength(max) => {
                let len = value.chars().count();
                if len > max {
                    return Err(format!(
                        "Ensure this value has at most {} characters (it has {}).",
                        max, len
                    ));
                }
            }
            Rule::MinLength(min) => {
                let len = value.chars().count();
                if len < min {
                    return Err(format!(
                        "Ensure this value has at least {} characters (it has {}).",
                        min, len
                    ));
                }
            }
            Rule::Email => {
                if !EMAIL_RE.is_match(value) {
                    return Err("Enter a valid email address.".to_string());
                }
            }
            Rule::Username => {
                if !USERNAME_RE.is_match(value) {
                    return Err("Enter a valid username. This value may contain only letters, \
                                numbers, and @/./+/-/_ characters."
                        .to_string());
                }
            }
            Rule::Range(min, max) => {
                let number: i64 = value
                    .parse()
                    .map_err(|_| "Enter a whole number.".to_string())?;
                if number < min || number > max {
                    return Err(format!("Ensure this value is between {} and {}.", min, max));
                }
            }
            Rule::NotNumeric => {
                if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
                    return Err("This value is entirely numeric.".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Run the rules of one field; an empty optional value skips the rest
pub fn run_rules(value: &str, rules: &[Rule]) -> Vec<String> {
    if value.is_empty() {
        return if rules.contains(&Rule::Required) {
            vec![REQUIRED_MESSAGE.to_string()]
        } else {
            Vec::new()
        };
    }
    rules
        .iter()
        .filter_map(|rule| rule.check(value).err())
        .collect()
}

// ============================================================================
// Typed cleaning
// ============================================================================

/// Turns submitted text into typed values while collecting errors
pub struct Cleaner<'a> {
    data: &'a FormData,
    errors: FormErrors,
}

impl<'a> Cleaner<'a> {
    pub fn new(data: &'a FormData) -> Self {
        Self {
            data,
            errors: FormErrors::new(),
        }
    }

    pub fn data(&self) -> &FormData {
        self.data
    }

    /// Trimmed text
    pub fn text(&mut self, field: &str, rules: &[Rule]) -> String {
        let value = self.data.get(field).unwrap_or("").trim().to_string();
        self.record(field, run_rules(&value, rules));
        value
    }

    /// Untrimmed text, for passwords
    pub fn raw(&mut self, field: &str, rules: &[Rule]) -> String {
        let value = self.data.get(field).unwrap_or("").to_string();
        self.record(field, run_rules(&value, rules));
        value
    }

    /// Whole number; a blank optional field yields `default`
    pub fn integer(&mut self, field: &str, rules: &[Rule], default: Option<i64>) -> Option<i64> {
        let value = self.data.get(field).unwrap_or("").trim().to_string();
        if value.is_empty() {
            if rules.contains(&Rule::Required) {
                self.errors.add(field, REQUIRED_MESSAGE);
                return None;
            }
            return default;
        }
        let number = match value.parse::<i64>() {
            Ok(number) => number,
            Err(_) => {
                self.errors.add(field, "Enter a whole number.");
                return None;
            }
        };
        let messages = run_rules(&value, rules);
        if messages.is_empty() {
            Some(number)
        } else {
            self.record(field, messages);
            None
        }
    }

    /// `YYYY-MM-DD` calendar date
    pub fn date(&mut self, field: &str, required: bool) -> Option<NaiveDate> {
        let value = self.data.get(field).unwrap_or("").trim();
        if value.is_empty() {
            if required {
                self.errors.add(field, REQUIRED_MESSAGE);
            }
            return None;
        }
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.errors.add(field, "Enter a valid date.");
                None
            }
        }
    }

    /// Selected ids of a multi-select; blanks are ignored, duplicates dropped
    pub fn ids(&mut self, field: &str) -> Vec<i64> {
        let mut ids = Vec::new();
        for raw in self.data.get_all(field) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<i64>() {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(_) => self.errors.add(
                    field,
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        raw
                    ),
                ),
            }
        }
        ids
    }

    /// Checkbox state; any submitted value other than false-like strings is on
    pub fn checkbox(&self, field: &str) -> bool {
        match self.data.get(field) {
            Some(value) => !matches!(value.trim(), "" | "0" | "false" | "off"),
            None => false,
        }
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// The cleaned value, or the aggregated report if anything failed
    pub fn finish<T>(self, value: T) -> Result<T, FormErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }

    fn record(&mut self, field: &str, messages: Vec<String>) {
        for message in messages {
            self.errors.add(field, message);
        }
    }
}
