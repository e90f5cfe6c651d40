//! Topic model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named subject that newspapers can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    /// Unique, at most 255 characters
    pub name: String,
}

impl Topic {
    pub const NAME_MAX_LENGTH: usize = 255;
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Allowed orderings for the topic listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicOrdering {
    /// Insertion order
    #[default]
    Id,
    NameAsc,
    NameDesc,
}

impl TopicOrdering {
    /// Parse the `sort` query parameter; unknown values fall back to insertion order
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("name") => Self::NameAsc,
            Some("-name") => Self::NameDesc,
            _ => Self::Id,
        }
    }

    /// The value echoed back into pagination links
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Id => "",
            Self::NameAsc => "name",
            Self::NameDesc => "-name",
        }
    }

    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            Self::Id => "id ASC",
            Self::NameAsc => "name ASC, id ASC",
            Self::NameDesc => "name DESC, id ASC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_display_is_name() {
        let topic = Topic {
            id: 1,
            name: "Politics".to_string(),
        };
        assert_eq!(topic.to_string(), "Politics");
    }

    #[test]
    fn test_ordering_from_param() {
        assert_eq!(TopicOrdering::from_param(Some("name")), TopicOrdering::NameAsc);
        assert_eq!(TopicOrdering::from_param(Some("-name")), TopicOrdering::NameDesc);
        assert_eq!(TopicOrdering::from_param(Some("id; DROP TABLE topics")), TopicOrdering::Id);
        assert_eq!(TopicOrdering::from_param(None), TopicOrdering::Id);
        assert_eq!(TopicOrdering::NameDesc.as_param(), "-name");
    }
}
