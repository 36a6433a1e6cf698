/// Base name of the optional configuration files (`selfhost.toml`, `selfhost.development.toml`, ...).
pub const CONFIG_NAME: &str = "selfhost";
/// Prefix of environment variable overrides (`SELFHOST__SERVER__PORT=8080`).
pub const ENV_PREFIX: &str = "SELFHOST";
/// Separator between nested keys in environment variable overrides.
pub const ENV_SEPARATOR: &str = "__";

/// Environment name that enables developer diagnostics.
pub const DEVELOPMENT: &str = "Development";
pub const PRODUCTION: &str = "Production";

/// Route of the single generated `OpenAPI` document (`v1`).
pub const OPENAPI_JSON_PATH: &str = "/swagger/v1/swagger.json";
pub const OPENAPI_UI_PATH: &str = "/swagger";

/// Suffix of the documentation-comment file placed next to the binary.
pub const DOCS_FILE_SUFFIX: &str = "docs.json";
