//! Application services shared by the route handlers.

pub mod catalog;
pub mod sessions;

pub use catalog::TemplateCatalog;
pub use sessions::{SessionError, SessionHandle, SessionRegistry};
