//! # Contribution Freshness Exporter
//!
//! ## Components:
//!
//! - **`ContributionMetrics`**: Owns a Prometheus recorder that is never
//!   installed globally. It holds one gauge per (domain, username) pair and
//!   renders them in the text exposition format.
//!
//! - **`Exporter`**: Polls every configured target concurrently on each scrape
//!   and records successful results into `ContributionMetrics`.
//!
//! - **`ExporterServer`**: (Defined in `server.rs`) An `axum`-based web server
//!   exposing `/metrics` and `/health`.

use crate::core::{ContributionSource, PollError, PollTarget};
use futures::future::join_all;
use metrics::{Key, KeyName, Label, Level, Metadata, Recorder, SharedString};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub mod server;

/// Name of the exported gauge family.
pub const LAST_CONTRIBUTION_TIME: &str = "cbng_monitoring_last_contribution_time";

/// The gauge registry backing `/metrics`.
///
/// A labelled gauge is only registered on its first successful record, so
/// pairs that were never polled successfully do not appear in the output.
/// Values are never expired.
pub struct ContributionMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl std::fmt::Debug for ContributionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContributionMetrics").finish_non_exhaustive()
    }
}

impl Default for ContributionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ContributionMetrics {
    /// Creates an empty registry and describes the gauge family.
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        recorder.describe_gauge(
            KeyName::from(LAST_CONTRIBUTION_TIME),
            None,
            SharedString::from("Timestamp of the last contribution"),
        );
        let handle = recorder.handle();
        Self { recorder, handle }
    }

    /// Overwrites the gauge for `target` with `timestamp` (Unix seconds).
    pub fn record(&self, target: &PollTarget, timestamp: i64) {
        let key = Key::from_parts(
            LAST_CONTRIBUTION_TIME,
            vec![
                Label::new("domain", target.domain.clone()),
                Label::new("username", target.username.clone()),
            ],
        );
        let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));
        self.recorder
            .register_gauge(&key, &metadata)
            .set(timestamp as f64);
    }

    /// Renders every registered gauge in the Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Polls the configured accounts and exposes their freshness gauges.
pub struct Exporter {
    source: Arc<dyn ContributionSource>,
    metrics: ContributionMetrics,
    targets: Vec<PollTarget>,
}

impl Exporter {
    /// Creates an exporter with an empty registry.
    pub fn new(source: Arc<dyn ContributionSource>, targets: Vec<PollTarget>) -> Self {
        Self {
            source,
            metrics: ContributionMetrics::new(),
            targets,
        }
    }

    /// The registry updated by successful polls.
    pub fn metrics(&self) -> &ContributionMetrics {
        &self.metrics
    }

    /// Polls one target and records the result.
    ///
    /// Returns the recorded timestamp. Any failure or an empty contribution
    /// list leaves the previous value in place and returns `None`.
    pub async fn poll(&self, target: &PollTarget) -> Option<i64> {
        match self.source.latest_contribution(target).await {
            Ok(Some(ts)) => {
                let timestamp = ts.timestamp();
                self.metrics.record(target, timestamp);
                debug!(
                    username = %target.username,
                    domain = %target.domain,
                    timestamp,
                    "Recorded last contribution time"
                );
                Some(timestamp)
            }
            Ok(None) => {
                warn!(
                    username = %target.username,
                    domain = %target.domain,
                    "No contributions returned, keeping previous value"
                );
                None
            }
            Err(e @ PollError::UnexpectedStatus { .. }) => {
                error!(username = %target.username, domain = %target.domain, error = %e, "Poll failed");
                None
            }
            Err(e) => {
                warn!(username = %target.username, domain = %target.domain, error = %e, "Poll failed");
                None
            }
        }
    }

    /// Polls every target concurrently, waits for all of them, then renders
    /// the registry. A failed poll never affects the others.
    pub async fn render_metrics(&self) -> String {
        let results = join_all(self.targets.iter().map(|target| self.poll(target))).await;
        debug!(
            polled = results.len(),
            updated = results.iter().filter(|r| r.is_some()).count(),
            "Scrape polling finished"
        );
        self.metrics.render()
    }
}
