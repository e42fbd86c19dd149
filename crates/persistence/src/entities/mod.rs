//! Database entity definitions.

pub mod process_submission;
pub mod process_template;

pub use process_submission::{ProcessSubmissionEntity, SubmissionStatusDb};
pub use process_template::ProcessTemplateEntity;
