//! # Exporter Server
//!
//! This module defines the `ExporterServer`, an `axum` web server exposing:
//!
//! - `/metrics`: polls every target, then returns the gauge registry in the
//!   Prometheus text exposition format.
//! - `/health`: a liveness constant with no dependency checks.
//!
//! The server stops accepting connections when the shutdown channel fires and
//! finishes in-flight scrapes before returning.

use super::Exporter;
use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, trace};

/// Content type of the Prometheus text exposition format, version 0.0.4.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Builds the router serving `/metrics` and `/health`.
pub fn router(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .route("/health", get(health))
        .with_state(exporter)
}

async fn render_metrics(State(exporter): State<Arc<Exporter>>) -> impl IntoResponse {
    let body = exporter.render_metrics().await;
    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body)
}

async fn health() -> &'static str {
    "OK"
}

/// A server that exposes the exporter to a Prometheus scraper.
pub struct ExporterServer {
    listener: TcpListener,
    exporter: Arc<Exporter>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ExporterServer {
    /// Creates a new `ExporterServer` but does not spawn it.
    ///
    /// # Arguments
    ///
    /// * `listener` - A `TcpListener` that has already been bound to an address.
    /// * `exporter` - The exporter answering `/metrics`.
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub fn new(
        listener: TcpListener,
        exporter: Arc<Exporter>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            listener,
            exporter,
            shutdown_rx,
        }
    }

    /// Returns a future that runs the server until a shutdown signal is received.
    pub fn run(self) -> impl Future<Output = ()> {
        let app = router(self.exporter);
        let mut shutdown_rx = self.shutdown_rx;

        async move {
            let shutdown = async move {
                // A dropped sender also counts as shutdown.
                let _ = shutdown_rx.changed().await;
                trace!("Exporter server received shutdown signal.");
            };
            if let Err(e) = axum::serve(self.listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("Exporter server error: {}", e);
            }
            trace!("Exporter server task finished.");
        }
    }
}
