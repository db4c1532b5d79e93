//! Shared helpers for integration tests.

pub mod app;
pub mod fake_source;
