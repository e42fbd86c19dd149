//! Repository implementations for database operations.

pub mod process_submission;
pub mod process_template;

pub use process_submission::{SubmissionQuery, SubmissionRepository};
pub use process_template::TemplateRepository;
