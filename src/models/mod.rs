//! Data models
//!
//! Entities persisted by the repositories (Topic, Redactor, Newspaper,
//! Session), their write inputs, and the pagination types shared by every
//! listing.

mod newspaper;
mod pagination;
mod redactor;
mod session;
mod topic;

pub use newspaper::{Newspaper, NewspaperInput};
pub use pagination::{ListParams, PageInfo, PagedResult, PAGE_SIZE};
pub use redactor::{
    check_years_of_experience, NewRedactor, Redactor, RedactorChanges, MAX_YEARS_OF_EXPERIENCE,
    MIN_YEARS_OF_EXPERIENCE,
};
pub use session::Session;
pub use topic::{Topic, TopicOrdering};
