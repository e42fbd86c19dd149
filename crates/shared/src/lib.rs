//! Shared utilities and common types for the GRC process backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Value checks for compliance form fields (email, URL, dates, ratings, uploads)
//! - PII detection for sensitive fields
//! - Cursor pagination

pub mod pagination;
pub mod validation;
