/// cbng-monitoring - Contribution freshness exporter
///
/// Polls the MediaWiki API for the last contribution of a fixed set of bot
/// accounts and exposes the timestamps as Prometheus gauges.
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod exporter;
pub mod wiki;

// Re-export core types for convenience
pub use core::*;
