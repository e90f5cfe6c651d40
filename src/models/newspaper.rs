//! Newspaper model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Redactor, Topic};

/// A published article with its topics and publishing redactors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Newspaper {
    pub id: i64,
    /// At most 255 characters, not unique
    pub title: String,
    pub content: String,
    pub published_date: NaiveDate,
    pub topics: Vec<Topic>,
    pub publishers: Vec<Redactor>,
}

impl Newspaper {
    pub const TITLE_MAX_LENGTH: usize = 255;

    pub fn topic_ids(&self) -> Vec<i64> {
        self.topics.iter().map(|t| t.id).collect()
    }

    pub fn publisher_ids(&self) -> Vec<i64> {
        self.publishers.iter().map(|r| r.id).collect()
    }
}

impl fmt::Display for Newspaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Values for creating or replacing a newspaper, relation sets included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewspaperInput {
    pub title: String,
    pub content: String,
    pub published_date: NaiveDate,
    pub topic_ids: Vec<i64>,
    pub publisher_ids: Vec<i64>,
}

impl NewspaperInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>, published_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            published_date,
            topic_ids: Vec::new(),
            publisher_ids: Vec::new(),
        }
    }
}
