use axum::extract::FromRef;
use selfhost_domain::build::BuildInfo;
use selfhost_domain::config::AppConfig;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: AppConfig,
    pub build: BuildInfo,
}

/// Shared state handed to every controller.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    pub fn new(config: AppConfig, build: BuildInfo) -> Self {
        Self { inner: Arc::new(ApiStateInner { config, build }) }
    }
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new(AppConfig::default(), BuildInfo::default())
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for AppConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for BuildInfo {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.build.clone()
    }
}
