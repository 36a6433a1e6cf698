use anyhow::{Context, Result};
use selfhost_kernel::domain::build::BuildInfo;
use selfhost_kernel::domain::config::LoggingConfig;
use selfhost_logger::{Logger, parse_level};

/// Installs the global subscriber from the `logging` configuration section.
///
/// Log files are prefixed with the binary name.
pub fn init_logger(build: &BuildInfo, cfg: &LoggingConfig) -> Result<Logger> {
    let mut builder = Logger::builder()
        .name(build.name.as_ref())
        .level(parse_level(&cfg.level)?)
        .console(cfg.console)
        .json(cfg.json);

    if let Some(filter) = &cfg.filter {
        builder = builder.env_filter(filter);
    }
    if let Some(path) = &cfg.path {
        builder = builder.path(path);
    }

    builder.init().context("Failed to initialize logging")
}
