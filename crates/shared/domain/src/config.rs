use crate::constants::{DEVELOPMENT, PRODUCTION};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level application configuration shared by the host and the window.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub environment: HostEnvironment,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub window: WindowConfig,
    pub docs: DocsConfig,
    pub shutdown: ShutdownConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
///
/// Deserializes through [`AppConfigInner`] so string-typed sources (environment
/// variables, command line) still coerce into numeric fields.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(from = "AppConfigInner")]
pub struct AppConfig {
    inner: Arc<AppConfigInner>,
}

impl From<AppConfigInner> for AppConfig {
    fn from(inner: AppConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Name of the hosting environment (`Development`, `Staging`, `Production`, ...).
///
/// Any name is accepted; comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct HostEnvironment(String);

impl HostEnvironment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn development() -> Self {
        Self::new(DEVELOPMENT)
    }

    pub fn production() -> Self {
        Self::new(PRODUCTION)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.is(DEVELOPMENT)
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::production()
    }
}

impl fmt::Display for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
}

/// Logging output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive (`trace`, `debug`, `info`, `warn`, `error`, `off`).
    pub level: String,
    /// Module directives such as `selfhost=debug,hyper=info`.
    pub filter: Option<String>,
    pub console: bool,
    /// Directory for daily-rolling log files; no file output when unset.
    pub path: Option<PathBuf>,
    pub json: bool,
}

/// Main window geometry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Falls back to the binary name when unset.
    pub title: Option<String>,
    pub width: f64,
    pub height: f64,
}

/// `OpenAPI` documentation sources.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Explicit documentation-comment file; defaults to `<binary>.docs.json` next to the executable.
    pub comments_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight requests may finish after the window closes.
    pub grace_seconds: u64,
}

impl ShutdownConfig {
    #[must_use]
    pub const fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_seconds)
    }
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::LOCALHOST), port: 5000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, console: true, path: None, json: false }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: None, width: 1024.0, height: 768.0 }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_seconds: 5 }
    }
}
