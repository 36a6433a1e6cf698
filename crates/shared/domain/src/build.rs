//! Build metadata of the executing binary.

use std::borrow::Cow;

/// Name and version of the binary that hosts the API.
///
/// Construct it with [`build_info!`](crate::build_info) from the binary crate so
/// the values describe the executable rather than a library in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub name: Cow<'static, str>,
    pub version: Cow<'static, str>,
}

impl BuildInfo {
    pub fn new(name: impl Into<Cow<'static, str>>, version: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into(), version: version.into() }
    }

    /// Version string published in the `OpenAPI` document (`v1.2.3`).
    #[must_use]
    pub fn api_version(&self) -> String {
        format!("v{}", self.version)
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

/// Captures [`BuildInfo`] of the crate invoking the macro.
///
/// Binaries pass `env!("CARGO_BIN_NAME")` so the document is titled after the
/// executable rather than the package.
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::build::BuildInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    };
    ($name:expr) => {
        $crate::build::BuildInfo::new($name, env!("CARGO_PKG_VERSION"))
    };
}
