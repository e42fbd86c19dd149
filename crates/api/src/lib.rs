//! HTTP service exposing compliance process templates and live process
//! instances.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
