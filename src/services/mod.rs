//! Services layer - Business logic
//!
//! Services sit between the request handlers and the repositories:
//! - Running the form validation pipeline before any write
//! - Mapping database constraint failures to integrity errors
//! - Password hashing and session handling

pub mod auth;
pub mod newspaper;
pub mod password;
pub mod redactor;
pub mod topic;

pub use auth::{AuthService, AuthServiceError};
pub use newspaper::{NewspaperService, NewspaperServiceError};
pub use password::{hash_password, verify_password};
pub use redactor::{PermissionSource, RedactorService, RedactorServiceError};
pub use topic::{TopicService, TopicServiceError};
