use super::authorization::{AuthorizationPolicy, authorize};
use super::docs::{DocsError, DocsErrorExt, render_json};
use super::exception::exception_boundary;
use super::state::ApiState;
use axum::Router;
use axum::body::Bytes;
use axum::http::header;
use axum::middleware;
use axum::routing::get;
use selfhost_domain::config::HostEnvironment;
use selfhost_domain::constants::{OPENAPI_JSON_PATH, OPENAPI_UI_PATH};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use utoipa::openapi::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// A request-processing step, listed in the order a request meets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Renders unhandled errors with their stack trace.
    DeveloperExceptionPage,
    /// Matches the request against the route table.
    ///
    /// Structural: axum's `Router` performs the match, so this stage has no layer
    /// of its own. It is listed to fix its position relative to [`Stage::Authorization`].
    Routing,
    /// Applies the [`AuthorizationPolicy`] to the matched route.
    Authorization,
    /// Dispatches to controller handlers.
    ///
    /// Structural as well: the controller routes are the router `assemble` starts from.
    Endpoints,
    /// Serves the `OpenAPI` JSON document.
    OpenApiDocument,
    /// Serves the interactive documentation page.
    OpenApiUi,
}

/// The fixed middleware pipeline, assembled once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn for_environment(environment: &HostEnvironment) -> Self {
        let mut stages = Vec::with_capacity(6);
        if environment.is_development() {
            stages.push(Stage::DeveloperExceptionPage);
        }
        stages.extend([
            Stage::Routing,
            Stage::Authorization,
            Stage::Endpoints,
            Stage::OpenApiDocument,
            Stage::OpenApiUi,
        ]);
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Builds the router for `endpoints` (already routed controllers) and `document`.
    ///
    /// Axum layers wrap inside-out, so the stages are applied from the
    /// endpoints outwards: authorization becomes a route layer (it runs only for
    /// matched routes), documentation routes are merged after it so they are
    /// never gated, and the exception boundary wraps everything.
    ///
    /// [`Stage::Routing`] and [`Stage::Endpoints`] add no layer: the `endpoints`
    /// router already matches and dispatches, and every pipeline contains both.
    ///
    /// # Errors
    /// Returns [`DocsError::Render`] if the document cannot be serialized.
    pub fn assemble(
        &self,
        state: ApiState,
        endpoints: Router<ApiState>,
        document: &OpenApi,
    ) -> Result<Router, DocsError> {
        let mut app = endpoints;

        if self.contains(Stage::Authorization) && app.has_routes() {
            let policy = AuthorizationPolicy::from_openapi(document);
            debug!(protected = policy.len(), "Authorization policy derived from document");
            app = app.route_layer(middleware::from_fn_with_state(policy, authorize));
        }

        let mut app = app.with_state(state);

        if self.contains(Stage::OpenApiDocument) {
            let json = render_json(document).context("Failed to render the v1 document")?;
            let body = Bytes::from(json);
            app = app.route(
                OPENAPI_JSON_PATH,
                get(move || {
                    let body = body.clone();
                    async move { ([(header::CONTENT_TYPE, "application/json")], body) }
                }),
            );
        }

        if self.contains(Stage::OpenApiUi) {
            app = app.merge(Scalar::with_url(OPENAPI_UI_PATH, document.clone()));
        }

        let app = app
            .layer(TraceLayer::new_for_http())
            .layer(exception_boundary(self.contains(Stage::DeveloperExceptionPage)));

        info!(stages = ?self.stages, "HTTP pipeline assembled");
        Ok(app)
    }
}
