//! Kernel utilities shared by the host and the window.
//! Keep this crate lightweight: configuration layering and, behind the `server`
//! feature, the HTTP pipeline pieces (state, controllers, authorization,
//! exception boundary, `OpenAPI` documents).
//!
//! ## Config loading
//! ```rust,no_run
//! use selfhost_kernel::config::{CommandLine, load_config};
//! use selfhost_kernel::domain::config::AppConfig;
//!
//! let cfg: AppConfig = load_config(&CommandLine::from_env()).unwrap_or_default();
//! ```
pub mod config;
mod error;
pub mod prelude;
#[cfg(feature = "server")]
pub mod server;

pub use selfhost_domain as domain;
