//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity; the admin
//! repository runs the generic changelist queries.

pub mod admin;
pub mod newspaper;
pub mod redactor;
pub mod session;
pub mod topic;

pub use admin::{AdminFilter, AdminQuery, AdminQueryRepository, SqlxAdminQueryRepository};
pub use newspaper::{NewspaperRepository, SqlxNewspaperRepository, NEWSPAPER_RELATIONS};
pub use redactor::{RedactorRepository, SqlxRedactorRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use topic::{SqlxTopicRepository, TopicRepository};

/// `?, ?, ?` for an `IN (...)` list of `n` values
pub(crate) fn in_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_placeholders() {
        assert_eq!(in_placeholders(1), "?");
        assert_eq!(in_placeholders(3), "?, ?, ?");
    }
}
