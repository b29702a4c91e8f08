//! # Client Runtime
//!
//! Owns the container and the background handlers.
//!
//! ## Startup Sequence
//!
//! 1. Build the container (validates configuration)
//! 2. Start the resync handler
//! 3. Bootstrap every domain from the server

use crate::adapters::Backend;
use crate::container::{ClientConfig, ClientContainer};
use crate::wiring::ResyncHandler;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use shared_bus::EventFilter;
use shared_types::TimeSource;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The client runtime orchestrating every domain.
pub struct ClientRuntime<B: Backend> {
    container: Arc<ClientContainer<B>>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
    handlers: Mutex<Vec<JoinHandle<()>>>,
}

impl<B: Backend> ClientRuntime<B> {
    /// Build the runtime. Fails on invalid configuration.
    pub fn new(config: ClientConfig, backend: Arc<B>, clock: Arc<dyn TimeSource>) -> Result<Self> {
        info!("Creating Rushlane client runtime");
        let container = ClientContainer::new(config, backend, clock)
            .context("Invalid client configuration")?;
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        Ok(Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            handlers: Mutex::new(Vec::new()),
        })
    }

    /// Start the handlers and load every domain.
    pub async fn start(&self) -> Result<()> {
        self.start_handlers();
        self.container
            .bootstrap()
            .await
            .context("Failed to load player state")?;
        info!("Client runtime started");
        Ok(())
    }

    fn start_handlers(&self) {
        let resync = ResyncHandler::new(
            self.container.clone(),
            self.container.bus.subscribe(EventFilter::rollbacks()),
        );
        let mut shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = resync.run() => {}
                _ = shutdown.changed() => {
                    info!("[resync] Shutdown signal received");
                }
            }
        });
        self.handlers.lock().push(handle);
        info!("Event handlers started");
    }

    /// Stop the handlers and wait for them to exit.
    pub async fn shutdown(&self) {
        info!("Initiating shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        let handlers: Vec<_> = self.handlers.lock().drain(..).collect();
        for handle in handlers {
            if let Err(e) = handle.await {
                error!("Handler task failed: {}", e);
            }
        }
        info!("Shutdown complete");
    }

    /// Sign out and stop.
    pub async fn sign_out(&self) {
        self.container.sign_out();
        self.shutdown().await;
    }

    /// The service container.
    pub fn container(&self) -> Arc<ClientContainer<B>> {
        Arc::clone(&self.container)
    }
}
