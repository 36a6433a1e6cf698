use config::ConfigBuilder;
use config::builder::DefaultState;
use tracing::debug;

/// Command-line configuration source.
///
/// The argument vector is passed through unmodified and interpreted as key/value
/// overrides, the way default hosts treat `args`:
///
/// * `--key=value` and `key=value`
/// * `--key value`
/// * `/key=value`
///
/// Nested keys are separated by `:` or `__` (`--server:port=8080`). Keys are
/// case-insensitive. Anything else (positional arguments, a trailing `--key`
/// without a value) is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    overrides: Vec<(String, String)>,
}

impl CommandLine {
    /// Parses the process arguments, skipping the program name.
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut overrides = Vec::new();
        let mut args = args.into_iter().map(Into::into).peekable();

        while let Some(arg) = args.next() {
            if let Some(switch) = arg.strip_prefix("--") {
                if let Some((key, value)) = switch.split_once('=') {
                    push(&mut overrides, key, value);
                } else if let Some(value) = args.next_if(|next| !next.starts_with("--")) {
                    push(&mut overrides, switch, &value);
                } else {
                    debug!(arg = %arg, "Ignoring command line switch without value");
                }
            } else if let Some((key, value)) =
                arg.strip_prefix('/').unwrap_or(&arg).split_once('=')
            {
                push(&mut overrides, key, value);
            } else {
                debug!(arg = %arg, "Ignoring positional command line argument");
            }
        }

        Self { overrides }
    }

    /// Normalized `(key, value)` pairs in argument order.
    pub fn overrides(&self) -> &[(String, String)] {
        &self.overrides
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Applies every pair as an override; later arguments win.
    pub(crate) fn apply(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        self.overrides
            .iter()
            .try_fold(builder, |builder, (key, value)| builder.set_override(key.as_str(), value.as_str()))
    }
}

fn push(overrides: &mut Vec<(String, String)>, key: &str, value: &str) {
    let key = normalize_key(key);
    if key.is_empty() {
        return;
    }
    overrides.push((key, value.to_owned()));
}

fn normalize_key(key: &str) -> String {
    key.trim().replace("__", ".").replace(':', ".").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(cmd: &CommandLine) -> Vec<(&str, &str)> {
        cmd.overrides().iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn test_supported_forms() {
        let cmd = CommandLine::parse([
            "--environment=Development",
            "--server:port",
            "8080",
            "/window:title=Inventory",
            "logging__level=debug",
        ]);

        assert_eq!(
            pairs(&cmd),
            vec![
                ("environment", "Development"),
                ("server.port", "8080"),
                ("window.title", "Inventory"),
                ("logging.level", "debug"),
            ]
        );
    }

    #[test]
    fn test_ignored_arguments() {
        let cmd = CommandLine::parse(["positional", "--dangling", "--=empty-key", "--flag"]);
        assert!(cmd.is_empty());
    }

    #[test]
    fn test_switch_does_not_swallow_next_switch() {
        let cmd = CommandLine::parse(["--verbose", "--server:port=1"]);
        assert_eq!(pairs(&cmd), vec![("server.port", "1")]);
    }

    #[test]
    fn test_value_may_contain_equals_sign() {
        let cmd = CommandLine::parse(["--logging:filter=selfhost=debug"]);
        assert_eq!(pairs(&cmd), vec![("logging.filter", "selfhost=debug")]);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let cmd = CommandLine::parse(["--Server:Port=9"]);
        assert_eq!(pairs(&cmd), vec![("server.port", "9")]);
    }
}
