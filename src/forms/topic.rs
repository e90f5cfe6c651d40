//! Topic form

use super::{Cleaner, FormData, FormErrors, Rule};
use crate::models::Topic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicForm {
    pub name: String,
}

impl TopicForm {
    pub fn clean(data: &FormData) -> Result<Self, FormErrors> {
        let mut cleaner = Cleaner::new(data);
        let name = cleaner.text("name", &[Rule::Required, Rule::MaxLength(Topic::NAME_MAX_LENGTH)]);
        cleaner.finish(Self { name })
    }

    /// Form values of an existing topic
    pub fn initial(topic: &Topic) -> FormData {
        FormData::from_pairs([("name", topic.name.as_str())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_form_valid() {
        let form = TopicForm::clean(&FormData::from_pairs([("name", "Test Topic")])).unwrap();
        assert_eq!(form.name, "Test Topic");
    }

    #[test]
    fn test_topic_form_invalid() {
        let errors = TopicForm::clean(&FormData::new()).unwrap_err();
        assert!(errors.has_field("name"));

        let long = "x".repeat(256);
        let errors = TopicForm::clean(&FormData::from_pairs([("name", long.as_str())])).unwrap_err();
        assert!(errors.field("name")[0].contains("at most 255"));
    }
}
