//! Domain layer for the GRC compliance process runtime.
//!
//! This crate contains:
//! - Template and submission models
//! - The field registry, validation engine and workflow navigator
//! - The runtime orchestrator and its persistence callback contract

pub mod models;
pub mod services;
