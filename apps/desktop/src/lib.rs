//! # SelfHost Desktop
//!
//! Process bootstrap: starts the self-hosted web API in the background and
//! runs the native window loop on the calling thread.
//!
//! ```no_run
//! use selfhost_desktop::{Bootstrap, MainWindow};
//!
//! fn main() -> anyhow::Result<()> {
//!     Bootstrap::builder().window(MainWindow::new).run()
//! }
//! ```
//!
//! Lifecycle of [`Bootstrap::run`]:
//! 1. build the background runtime and start the API host (returns once listening)
//! 2. construct the window from a [`WindowContext`]
//! 3. run the window loop until it exits
//! 4. stop the host gracefully and shut the runtime down

mod main_window;

pub use crate::main_window::MainWindow;

use anyhow::{Context, Result, anyhow};
use selfhost_kernel::domain::build::BuildInfo;
use selfhost_kernel::domain::build_info;
use selfhost_kernel::domain::config::AppConfig;
use selfhost_kernel::domain::constants::OPENAPI_UI_PATH;
use selfhost_kernel::server::Controllers;
use selfhost_logger::Logger;
use selfhost_runtime::{RuntimeConfig, build_runtime_with_config};
use selfhost_server::{RunningServer, Server};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

/// A native window whose event loop owns the calling thread.
pub trait Window {
    /// Runs the event loop until the window closes.
    fn run(self) -> Result<()>;
}

type WindowFactory<W> = Box<dyn FnOnce(&WindowContext) -> Result<W>>;

/// Everything the window may depend on, handed to the factory once.
#[derive(Debug, Clone)]
pub struct WindowContext {
    pub config: AppConfig,
    pub build: BuildInfo,
    pub api_address: SocketAddr,
    pub host: HostHandle,
}

impl WindowContext {
    /// URL of the interactive API documentation.
    #[must_use]
    pub fn docs_url(&self) -> String {
        format!("http://{}{OPENAPI_UI_PATH}", self.api_address)
    }
}

/// Stops the background API host.
///
/// Callable from any thread, including one driving another Tokio runtime;
/// only the first call does work.
#[derive(Clone)]
pub struct HostHandle {
    running: Arc<Mutex<Option<RunningServer>>>,
    logger: Arc<Mutex<Option<Logger>>>,
    runtime: Handle,
    grace: Duration,
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHandle")
            .field("running", &self.is_running())
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

impl HostHandle {
    fn new(running: RunningServer, logger: Option<Logger>, runtime: Handle, grace: Duration) -> Self {
        Self {
            running: Arc::new(Mutex::new(Some(running))),
            logger: Arc::new(Mutex::new(logger)),
            runtime,
            grace,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.lock().is_ok_and(|slot| slot.is_some())
    }

    /// Gracefully stops the listener and waits for in-flight requests (bounded
    /// by the configured grace period), then releases the retained [`Logger`]
    /// so buffered file output is flushed before the process exits.
    ///
    /// # Errors
    /// Returns an error if the accept loop failed while stopping.
    pub fn stop(&self) -> Result<()> {
        let stopped = match self.running.lock().ok().and_then(|mut slot| slot.take()) {
            Some(running) => self.wait_for(running),
            None => Ok(()),
        };
        if let Some(logger) = self.logger.lock().ok().and_then(|mut slot| slot.take()) {
            drop(logger);
        }
        stopped
    }

    // `block_on` panics on a thread that already drives a runtime (the Dioxus
    // event loop runs inside one), so the wait gets its own thread.
    fn wait_for(&self, running: RunningServer) -> Result<()> {
        let (runtime, grace) = (&self.runtime, self.grace);
        thread::scope(|scope| {
            let joined = scope.spawn(move || runtime.block_on(running.shutdown(grace))).join();
            joined.map_err(|_| anyhow!("API host shutdown thread panicked"))?
        })
    }
}

/// A fluent builder for the process [`Bootstrap`].
#[must_use = "builders do nothing unless you call .window()"]
#[derive(Debug)]
pub struct BootstrapBuilder {
    config: AppConfig,
    build: BuildInfo,
    controllers: Controllers,
    comments_path: Option<PathBuf>,
    runtime: RuntimeConfig,
    logger: Option<Logger>,
}

impl Default for BootstrapBuilder {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            build: build_info!(),
            controllers: Controllers::default(),
            comments_path: None,
            runtime: RuntimeConfig::background_host(),
            logger: None,
        }
    }
}

impl BootstrapBuilder {
    /// Resolved configuration, shared by the host and the window.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build_info(mut self, build: BuildInfo) -> Self {
        self.build = build;
        self
    }

    pub fn controllers(mut self, controllers: Controllers) -> Self {
        self.controllers = controllers;
        self
    }

    pub fn comments_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.comments_path = Some(path.into());
        self
    }

    /// Profile of the runtime hosting the API.
    pub fn runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    /// Keeps the logging handle alive until the host stops.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Registers the main window factory. It runs once, after the host is listening.
    pub fn window<W, F>(self, factory: F) -> Bootstrap<W>
    where
        W: Window,
        F: FnOnce(&WindowContext) -> Result<W> + 'static,
    {
        Bootstrap { settings: self, factory: Box::new(factory) }
    }
}

/// A configured process ready to run.
#[must_use = "call .run() to start the host and the window"]
pub struct Bootstrap<W> {
    settings: BootstrapBuilder,
    factory: WindowFactory<W>,
}

impl<W> fmt::Debug for Bootstrap<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl Bootstrap<()> {
    pub fn builder() -> BootstrapBuilder {
        BootstrapBuilder::default()
    }
}

impl<W: Window> Bootstrap<W> {
    /// Starts the host, runs the window loop on this thread, then stops the host.
    ///
    /// # Errors
    /// Returns an error if the runtime, the host or the window cannot be
    /// started, or if the window loop fails. The host is stopped in every case.
    pub fn run(self) -> Result<()> {
        let Self { settings, factory } = self;
        let grace = settings.config.shutdown.grace();

        let runtime = build_runtime_with_config(&settings.runtime)?;

        let mut server = Server::builder()
            .config(settings.config.clone())
            .build_info(settings.build.clone())
            .controllers(settings.controllers);
        if let Some(path) = settings.comments_path {
            server = server.comments_path(path);
        }
        let server = server.build().context("Failed to build the API host")?;
        let running = runtime.block_on(server.start()).context("Failed to start the API host")?;

        let context = WindowContext {
            config: settings.config,
            build: settings.build,
            api_address: running.address(),
            host: HostHandle::new(running, settings.logger, runtime.handle().clone(), grace),
        };
        let host = context.host.clone();

        let outcome = factory(&context)
            .context("Failed to create the main window")
            .and_then(|window| {
                info!(api = %context.api_address, "Entering window loop");
                window.run()
            });
        info!("Window loop exited");
        if let Err(e) = &outcome {
            warn!("Window terminated with an error: {e:#}");
        }

        if let Err(e) = host.stop() {
            error!("API host did not stop cleanly: {e:#}");
        }
        drop(context);
        runtime.shutdown_timeout(grace);

        outcome
    }
}
