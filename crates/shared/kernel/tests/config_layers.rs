use selfhost_kernel::config::{CommandLine, ConfigError, ConfigLoader};
use selfhost_kernel::domain::config::AppConfig;
use std::fs;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const NO_ENV: [(&str, &str); 0] = [];

#[test]
fn missing_files_fall_back_to_defaults() -> TestResult {
    let dir = tempdir()?;

    let cfg: AppConfig = ConfigLoader::new(dir.path().join("selfhost")).env_vars(NO_ENV).load()?;

    assert_eq!(cfg.server.port, 5000);
    assert_eq!(cfg.environment.name(), "Production");
    Ok(())
}

#[test]
fn layers_apply_in_precedence_order() -> TestResult {
    let dir = tempdir()?;
    let base = dir.path().join("selfhost");
    fs::write(
        dir.path().join("selfhost.toml"),
        "[server]\nport = 7000\n\n[window]\ntitle = \"From file\"\nwidth = 300.0\n",
    )?;

    let cfg: AppConfig = ConfigLoader::new(&base)
        .env_vars([("SELFHOST__SERVER__PORT", "7100"), ("SELFHOST__WINDOW__WIDTH", "400")])
        .args(CommandLine::parse(["--server:port=7200"]))
        .load()?;

    assert_eq!(cfg.server.port, 7200, "command line wins over environment and file");
    assert!((cfg.window.width - 400.0).abs() < f64::EPSILON, "environment wins over file");
    assert_eq!(cfg.window.title.as_deref(), Some("From file"));
    Ok(())
}

#[test]
fn environment_specific_file_is_layered_over_base() -> TestResult {
    let dir = tempdir()?;
    let base = dir.path().join("selfhost");
    fs::write(dir.path().join("selfhost.toml"), "[server]\nport = 7000\n")?;
    fs::write(dir.path().join("selfhost.development.toml"), "[server]\nport = 7001\n")?;

    let production: AppConfig = ConfigLoader::new(&base).env_vars(NO_ENV).load()?;
    assert_eq!(production.server.port, 7000);

    let development: AppConfig = ConfigLoader::new(&base)
        .env_vars([("SELFHOST__ENVIRONMENT", "Development")])
        .load()?;
    assert!(development.environment.is_development());
    assert_eq!(development.server.port, 7001);
    Ok(())
}

#[test]
fn malformed_file_is_reported() -> TestResult {
    let dir = tempdir()?;
    fs::write(dir.path().join("selfhost.toml"), "[server\nport = ")?;

    let result = ConfigLoader::new(dir.path().join("selfhost")).env_vars(NO_ENV).load::<AppConfig>();

    assert!(matches!(result, Err(ConfigError::Config { context: Some(_), .. })));
    Ok(())
}

#[test]
fn invalid_value_type_is_reported() -> TestResult {
    let dir = tempdir()?;

    let result = ConfigLoader::new(dir.path().join("selfhost"))
        .env_vars(NO_ENV)
        .args(CommandLine::parse(["--server:port=not-a-port"]))
        .load::<AppConfig>();

    let err = result.expect_err("port must be numeric");
    assert!(err.to_string().contains("Failed to deserialize config"));
    Ok(())
}
