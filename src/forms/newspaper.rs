//! Newspaper forms

use super::{Cleaner, FormData, FormErrors, Rule};
use crate::models::{Newspaper, NewspaperInput};
use chrono::NaiveDate;

/// Create/update form; `topic` and `publishers` are multi-valued id fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewspaperForm {
    pub title: String,
    pub content: String,
    pub published_date: NaiveDate,
    pub topic_ids: Vec<i64>,
    pub publisher_ids: Vec<i64>,
}

impl NewspaperForm {
    pub fn clean(data: &FormData) -> Result<Self, FormErrors> {
        let mut cleaner = Cleaner::new(data);

        let title = cleaner.text(
            "title",
            &[Rule::Required, Rule::MaxLength(Newspaper::TITLE_MAX_LENGTH)],
        );
        let content = cleaner.text("content", &[Rule::Required]);
        let published_date = cleaner.date("published_date", true);
        let topic_ids = cleaner.ids("topic");
        let publisher_ids = cleaner.ids("publishers");

        match published_date {
            Some(published_date) => cleaner.finish(Self {
                title,
                content,
                published_date,
                topic_ids,
                publisher_ids,
            }),
            None => Err(cleaner.finish(()).err().unwrap_or_default()),
        }
    }

    /// Form values of an existing newspaper
    pub fn initial(newspaper: &Newspaper) -> FormData {
        let date = newspaper.published_date.format("%Y-%m-%d").to_string();
        let mut data = FormData::from_pairs([
            ("title", newspaper.title.as_str()),
            ("content", newspaper.content.as_str()),
            ("published_date", date.as_str()),
        ]);
        for topic in &newspaper.topics {
            data.append("topic", topic.id.to_string());
        }
        for publisher in &newspaper.publishers {
            data.append("publishers", publisher.id.to_string());
        }
        data
    }

    pub fn into_input(self) -> NewspaperInput {
        NewspaperInput {
            title: self.title,
            content: self.content,
            published_date: self.published_date,
            topic_ids: self.topic_ids,
            publisher_ids: self.publisher_ids,
        }
    }
}

/// Title search box of the newspaper listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewspaperSearchForm {
    pub title: Option<String>,
}

impl NewspaperSearchForm {
    pub fn clean(data: &FormData) -> Result<Self, FormErrors> {
        let mut cleaner = Cleaner::new(data);
        let title = cleaner.text("title", &[Rule::MaxLength(Newspaper::TITLE_MAX_LENGTH)]);
        cleaner.finish(Self {
            title: Some(title).filter(|t| !t.is_empty()),
        })
    }
}
