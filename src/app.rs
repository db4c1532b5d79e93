//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::ContributionSource,
    exporter::{server::ExporterServer, Exporter},
    wiki::WikiApiClient,
};
use anyhow::{Context, Result};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::watch, task::JoinHandle};
use tracing::{error, info, instrument};

/// A handle to the running application.
pub struct App {
    local_addr: SocketAddr,
    server_handle: JoinHandle<()>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the HTTP server is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs until the shutdown signal fires and the server has drained.
    pub async fn run(self) -> Result<()> {
        if let Err(e) = self.server_handle.await {
            error!("Exporter server task panicked: {:?}", e);
            return Err(e.into());
        }
        info!("Exporter server shut down.");
        Ok(())
    }

    /// Runs until `signal` completes, then waits for the server to drain.
    ///
    /// `signal` is expected to fire the shutdown channel passed to
    /// [`AppBuilder::build`]. If the server stops before `signal` completes,
    /// this returns an error instead of waiting on `signal` forever.
    pub async fn run_until<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut server_handle = self.server_handle;
        tokio::select! {
            _ = signal => {
                server_handle.await?;
                info!("Exporter server shut down.");
                Ok(())
            }
            result = &mut server_handle => {
                result?;
                anyhow::bail!("exporter server stopped before a shutdown was requested")
            }
        }
    }
}

/// Builder for the main application.
///
/// Separates constructing the components from running them, and lets tests
/// replace the wiki API client.
pub struct AppBuilder {
    config: Config,
    source_override: Option<Arc<dyn ContributionSource>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source_override: None,
        }
    }

    /// Overrides the contribution source for testing.
    pub fn source_override(mut self, source: Arc<dyn ContributionSource>) -> Self {
        self.source_override = Some(source);
        self
    }

    /// Binds the listener and spawns the server, returning a runnable `App`.
    ///
    /// Failing to bind the listening address is the only fatal error.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;

        let source = match self.source_override {
            Some(source) => source,
            None => Arc::new(WikiApiClient::new(&config.api)?) as Arc<dyn ContributionSource>,
        };
        let exporter = Arc::new(Exporter::new(source, config.targets.clone()));

        let listener = TcpListener::bind(config.server.listen_address)
            .await
            .with_context(|| {
                format!(
                    "failed to bind exporter server to {}",
                    config.server.listen_address
                )
            })?;
        let local_addr = listener.local_addr()?;

        let server = ExporterServer::new(listener, exporter, shutdown_rx);
        let server_handle = tokio::spawn(server.run());
        info!(address = %local_addr, "Exporter server listening.");

        Ok(App {
            local_addr,
            server_handle,
        })
    }
}
