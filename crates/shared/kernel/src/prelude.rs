pub use crate::config::{CommandLine, ConfigError, ConfigErrorExt, ConfigLoader, load_config};
pub use selfhost_domain::build::BuildInfo;
pub use selfhost_domain::config::{AppConfig, HostEnvironment};

#[cfg(feature = "server")]
pub use crate::server::{
    ApiState, AuthorizationPolicy, Controllers, DocComments, DocsError, Pipeline, Stage,
};
