#![allow(dead_code)]
//! Test helpers for running the full application instance.

use anyhow::Result;
use cbng_monitoring::{app::AppBuilder, config::Config, core::ContributionSource};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::timeout};

/// A running instance of the application bound to a free local port.
#[derive(Debug)]
pub struct TestApp {
    pub addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    app_handle: JoinHandle<Result<()>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::get(self.url(path))
            .await
            .expect("request to test app failed")
    }

    pub async fn scrape(&self) -> String {
        self.get("/metrics").await.text().await.unwrap()
    }

    /// Shuts down the application and waits for it to terminate.
    pub async fn shutdown(self, timeout_duration: Duration) -> Result<()> {
        self.shutdown_tx
            .send(true)
            .expect("Failed to send shutdown signal");

        match timeout(timeout_duration, self.app_handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(anyhow::anyhow!("App failed to shut down within the timeout")),
        }
    }
}

/// A builder for creating `TestApp` instances.
pub struct TestAppBuilder {
    pub config: Config,
    source: Option<Arc<dyn ContributionSource>>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.listen_address = SocketAddr::from(([127, 0, 0, 1], 0));
        Self {
            config,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn ContributionSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_api_base_url(mut self, url: String) -> Self {
        self.config.api.base_url = Some(url);
        self
    }

    pub async fn start(self) -> Result<TestApp> {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut builder = AppBuilder::new(self.config);
        if let Some(source) = self.source {
            builder = builder.source_override(source);
        }
        let app = builder.build(shutdown_rx).await?;
        let addr = app.local_addr();
        let app_handle = tokio::spawn(app.run());

        Ok(TestApp {
            addr,
            shutdown_tx,
            app_handle,
        })
    }
}
