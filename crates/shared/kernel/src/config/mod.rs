mod args;

pub use args::CommandLine;

use crate::error::format_context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, Map};
use selfhost_domain::constants::{CONFIG_NAME, ENV_PREFIX, ENV_SEPARATOR};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key holding the hosting environment name.
const ENVIRONMENT_KEY: &str = "environment";

/// Custom error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

pub trait ConfigErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError>;
}

impl<T> ConfigErrorExt<T> for Result<T, ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                ConfigError::Config { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> ConfigErrorExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

/// A layered configuration loader following the default host conventions.
///
/// Sources, from lowest to highest precedence:
/// 1. **Defaults** of the target type (`#[serde(default)]`).
/// 2. **Base file** `<name>.{toml,json,yaml,...}`, optional.
/// 3. **Environment file** `<name>.<environment>.*`, optional. The environment
///    name is resolved from the remaining layers first.
/// 4. **Environment variables** prefixed with `SELFHOST__`; nested keys are
///    separated by double underscores (`SELFHOST__SERVER__PORT` maps to `server.port`).
/// 5. **Command line** arguments, see [`CommandLine`].
///
/// # Example
/// ```rust
/// use selfhost_kernel::config::{CommandLine, ConfigLoader};
/// use selfhost_kernel::domain::config::AppConfig;
///
/// let cfg: AppConfig = ConfigLoader::new("does-not-exist")
///     .args(CommandLine::parse(["--server:port=8080"]))
///     .env_vars([("SELFHOST__WINDOW__WIDTH", "800")])
///     .load()
///     .unwrap();
/// assert_eq!(cfg.server.port, 8080);
/// assert!((cfg.window.width - 800.0).abs() < f64::EPSILON);
/// ```
#[must_use = "call .load() to read the configuration"]
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    name: PathBuf,
    args: CommandLine,
    env_vars: Option<Map<String, String>>,
}

impl ConfigLoader {
    pub fn new(name: impl AsRef<Path>) -> Self {
        Self { name: name.as_ref().to_path_buf(), args: CommandLine::default(), env_vars: None }
    }

    pub fn args(mut self, args: CommandLine) -> Self {
        self.args = args;
        self
    }

    /// Replaces the process environment as the source of `SELFHOST__*` overrides.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Reads all layers and deserializes them into `T`.
    ///
    /// # Errors
    /// Returns an error if a present file is malformed, an override cannot be
    /// applied, or the merged values do not match the structure of `T`.
    pub fn load<T>(&self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let environment = self
            .layered(None)?
            .build()
            .context("Failed to resolve hosting environment")?
            .get_string(ENVIRONMENT_KEY)
            .ok();

        info!(
            name = %self.name.display(),
            environment = environment.as_deref().unwrap_or("<default>"),
            "Loading configuration"
        );

        let config = self
            .layered(environment.as_deref())?
            .build()
            .context("Failed to build config")?
            .try_deserialize::<T>()
            .context("Failed to deserialize config")?;

        Ok(config)
    }

    fn layered(&self, environment: Option<&str>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let base = self.name.to_string_lossy();
        let mut builder =
            Config::builder().add_source(File::with_name(&base).required(false));

        if let Some(environment) = environment {
            let file = format!("{base}.{}", environment.to_lowercase());
            debug!(file = %file, "Adding environment-specific config file");
            builder = builder.add_source(File::with_name(&file).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .source(self.env_vars.clone()),
        );

        self.args.apply(builder).context("Failed to apply command line overrides")
    }
}

/// Loads the application configuration named [`CONFIG_NAME`] from the working
/// directory, the process environment and the given command line.
///
/// # Errors
/// See [`ConfigLoader::load`].
pub fn load_config<T>(args: &CommandLine) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    ConfigLoader::new(CONFIG_NAME).args(args.clone()).load()
}
