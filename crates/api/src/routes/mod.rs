//! HTTP route handlers.

pub mod health;
pub mod processes;
pub mod templates;
pub mod validate;
