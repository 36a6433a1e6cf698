//! # SelfHost Server
//!
//! The self-hosted web API: controllers, authorization, `OpenAPI` documentation
//! and the exception boundary, served by `axum-server` with a handle-driven
//! graceful shutdown.
//!
//! The host can run embedded (the desktop bootstrap calls [`Server::start`]
//! and stops it when the window closes) or headless through [`Server::run`].
//!
//! ## Example
//! ```no_run
//! use selfhost_server::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let running = Server::builder().port(0).build()?.start().await?;
//!     println!("docs at http://{}/swagger", running.address());
//!     running.shutdown(Duration::from_secs(5)).await
//! }
//! ```

mod logging;

pub use crate::logging::init_logger;

use anyhow::{Context, Result, bail};
use axum::Router;
use axum_server::Handle;
use selfhost_kernel::domain::build::BuildInfo;
use selfhost_kernel::domain::build_info;
use selfhost_kernel::domain::config::AppConfig;
use selfhost_kernel::server::docs::describe;
use selfhost_kernel::server::{ApiState, Controllers, DocComments, Pipeline};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug)]
pub struct ServerBuilder {
    config: AppConfig,
    build: BuildInfo,
    controllers: Controllers,
    comments_path: Option<PathBuf>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            build: build_info!(),
            controllers: Controllers::default(),
            comments_path: None,
        }
    }
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the configured port; `0` binds an ephemeral port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Name and version published in the `OpenAPI` document.
    pub fn build_info(mut self, build: BuildInfo) -> Self {
        self.build = build;
        self
    }

    pub fn controllers(mut self, controllers: Controllers) -> Self {
        self.controllers = controllers;
        self
    }

    /// Explicit documentation-comment file. Takes precedence over
    /// `docs.comments_path` and the file next to the executable.
    pub fn comments_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.comments_path = Some(path.into());
        self
    }

    fn resolve_comments_path(&self) -> Option<PathBuf> {
        self.comments_path
            .clone()
            .or_else(|| self.config.docs.comments_path.clone())
            .or_else(|| DocComments::default_path(&self.build))
    }

    /// Consumes the builder and wires the host.
    ///
    /// # Process
    /// 1. Registers the controllers and gathers their `OpenAPI` paths
    /// 2. Generates the `v1` document from the build metadata
    /// 3. Merges documentation comments, if the file exists
    /// 4. Assembles the middleware pipeline for the configured environment
    ///
    /// # Errors
    /// Returns an error if the documentation-comment file exists but is
    /// unreadable or malformed, or if the document cannot be rendered.
    pub fn build(self) -> Result<Server> {
        let address = SocketAddr::new(self.config.server.address, self.config.server.port);
        info!(
            address = %address,
            environment = %self.config.environment,
            controllers = self.controllers.len(),
            "Initializing server"
        );

        let comments = match self.resolve_comments_path() {
            Some(path) => DocComments::load(&path).context("Failed to load documentation comments")?,
            None => {
                debug!("No documentation-comment location could be resolved");
                None
            }
        };

        let (endpoints, document) = describe(&self.build, self.controllers, comments.as_ref());
        let state = ApiState::new(self.config.clone(), self.build);
        let app = Pipeline::for_environment(&self.config.environment)
            .assemble(state, endpoints, &document)
            .context("Failed to assemble the HTTP pipeline")?;

        Ok(Server { app, address, grace: self.config.shutdown.grace() })
    }
}

/// A fully wired server, not yet bound.
#[must_use = "call .start().await or .run().await to serve requests"]
#[derive(Debug)]
pub struct Server {
    app: Router,
    address: SocketAddr,
    grace: Duration,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Binds the listener and spawns the accept loop on the current runtime.
    ///
    /// Returns once the listener accepts connections; the server keeps
    /// running until the returned [`RunningServer`] (or one of its
    /// [`ShutdownHandle`]s) stops it.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound.
    pub async fn start(self) -> Result<RunningServer> {
        let Self { app, address: requested, .. } = self;
        let handle = Handle::<SocketAddr>::new();

        let server = axum_server::bind(requested).handle(handle.clone());
        let task = tokio::spawn(async move { server.serve(app.into_make_service()).await });

        let Some(address) = handle.listening().await else {
            task.await
                .context("HTTP server task failed")?
                .with_context(|| format!("Failed to bind {requested}"))?;
            bail!("HTTP server stopped before listening on {requested}");
        };

        info!("Starting HTTP server on http://{address}");
        Ok(RunningServer { address, handle, task })
    }

    /// Headless mode: serves until Ctrl+C or SIGTERM, then shuts down gracefully.
    ///
    /// # Errors
    /// Returns an error if binding fails or the server stops abnormally.
    pub async fn run(self) -> Result<()> {
        let grace = self.grace;
        let running = self.start().await?;

        if let Err(e) = shutdown_signal().await {
            error!("Error while waiting for shutdown signal: {e}");
        }
        info!("Shutdown signal received, starting graceful shutdown...");
        running.shutdown(grace).await
    }
}

/// A listening server.
#[must_use = "dropping the handle leaves the server running detached"]
#[derive(Debug)]
pub struct RunningServer {
    address: SocketAddr,
    handle: Handle<SocketAddr>,
    task: JoinHandle<io::Result<()>>,
}

impl RunningServer {
    /// The bound address (with the actual port when `0` was requested).
    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { handle: self.handle.clone() }
    }

    /// Stops accepting, gives in-flight requests up to `grace`, then waits
    /// for the accept loop to finish.
    ///
    /// # Errors
    /// Returns an error if the accept loop failed or panicked.
    pub async fn shutdown(self, grace: Duration) -> Result<()> {
        info!(grace = ?grace, "Stopping HTTP server");
        self.handle.graceful_shutdown(Some(grace));
        self.wait().await
    }

    /// Waits until the accept loop finishes (after a shutdown was requested).
    ///
    /// # Errors
    /// Returns an error if the accept loop failed or panicked.
    pub async fn wait(self) -> Result<()> {
        self.task.await.context("HTTP server task panicked")?.context("HTTP server failed")?;
        info!("Server shutdown complete");
        Ok(())
    }
}

/// Cloneable trigger for stopping a [`RunningServer`] from another thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    handle: Handle<SocketAddr>,
}

impl ShutdownHandle {
    /// Requests a graceful stop; in-flight requests get up to `grace`.
    pub fn graceful(&self, grace: Duration) {
        self.handle.graceful_shutdown(Some(grace));
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_overrides_config() {
        let builder = Server::builder().port(0);
        assert_eq!(builder.config.server.port, 0);
        assert_eq!(AppConfig::default().server.port, 5000, "shared defaults untouched");
    }

    #[test]
    fn test_explicit_comments_path_wins() {
        let mut config = AppConfig::default();
        config.docs.comments_path = Some(PathBuf::from("configured.docs.json"));

        let builder = Server::builder().config(config.clone());
        assert_eq!(builder.resolve_comments_path(), Some(PathBuf::from("configured.docs.json")));

        let builder = Server::builder().config(config).comments_path("explicit.docs.json");
        assert_eq!(builder.resolve_comments_path(), Some(PathBuf::from("explicit.docs.json")));
    }

    #[test]
    fn test_default_build_info_names_this_crate() {
        assert_eq!(Server::builder().build.name, "selfhost-server");
    }
}
