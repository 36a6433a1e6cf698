//! Authorization enforcement with the default policy: a request is denied only
//! when the matched operation demands authorization.
//!
//! An operation demands authorization when its `OpenAPI` description (or the
//! document, globally) declares a non-empty security requirement. No
//! authentication scheme is configured, so such requests are always answered
//! with `401 Unauthorized`.

use super::docs::operations;
use axum::Json;
use axum::extract::{MatchedPath, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::openapi::OpenApi;
use utoipa::openapi::security::SecurityRequirement;

#[derive(Debug, Clone, Default)]
pub struct AuthorizationPolicy {
    protected: Arc<HashSet<(Method, String)>>,
}

impl AuthorizationPolicy {
    /// Derives the policy from the operations of a generated document.
    pub fn from_openapi(doc: &OpenApi) -> Self {
        let global = doc.security.as_deref();
        let mut protected = HashSet::new();

        for (path, item) in &doc.paths.paths {
            for (method, operation) in operations(item) {
                let requirements = operation.security.as_deref().or(global);
                if requirements.is_some_and(demands_authorization) {
                    debug!(method = %method, path = %path, "Route requires authorization");
                    protected.insert((method, path.clone()));
                }
            }
        }

        Self { protected: Arc::new(protected) }
    }

    /// Whether the route template `path` demands authorization for `method`.
    pub fn demands(&self, method: &Method, path: &str) -> bool {
        let method = if *method == Method::HEAD { &Method::GET } else { method };
        self.protected.contains(&(method.clone(), path.to_owned()))
    }

    /// Number of protected operations.
    pub fn len(&self) -> usize {
        self.protected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protected.is_empty()
    }
}

/// An empty requirement object in the list makes the operation optionally anonymous.
fn demands_authorization(requirements: &[SecurityRequirement]) -> bool {
    !requirements.is_empty()
        && !requirements.iter().any(|requirement| *requirement == SecurityRequirement::default())
}

/// Route-level middleware; must run after routing so [`MatchedPath`] is known.
pub async fn authorize(
    State(policy): State<AuthorizationPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let demanded = request
        .extensions()
        .get::<MatchedPath>()
        .is_some_and(|matched| policy.demands(request.method(), matched.as_str()));

    if demanded {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Request denied: route requires authorization"
        );
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" })))
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::path::{HttpMethod, Operation, PathItem};
    use utoipa::openapi::{Info, Paths};

    fn document(operation: Operation) -> OpenApi {
        let mut paths = Paths::new();
        paths.paths.insert("/items/{id}".to_owned(), PathItem::new(HttpMethod::Get, operation));
        OpenApi::new(Info::new("test", "v1"), paths)
    }

    #[test]
    fn test_secured_operation_is_protected() {
        let mut operation = Operation::new();
        operation.security = Some(vec![SecurityRequirement::new("bearer", Vec::<String>::new())]);

        let policy = AuthorizationPolicy::from_openapi(&document(operation));

        assert_eq!(policy.len(), 1);
        assert!(policy.demands(&Method::GET, "/items/{id}"));
        assert!(policy.demands(&Method::HEAD, "/items/{id}"));
        assert!(!policy.demands(&Method::POST, "/items/{id}"));
    }

    #[test]
    fn test_operation_without_security_is_open() {
        let policy = AuthorizationPolicy::from_openapi(&document(Operation::new()));
        assert!(policy.is_empty());
    }

    #[test]
    fn test_optional_security_is_open() {
        let mut operation = Operation::new();
        operation.security = Some(vec![
            SecurityRequirement::new("bearer", Vec::<String>::new()),
            SecurityRequirement::default(),
        ]);

        let policy = AuthorizationPolicy::from_openapi(&document(operation));
        assert!(policy.is_empty());
    }

    #[test]
    fn test_global_security_applies_to_undeclared_operations() {
        let mut doc = document(Operation::new());
        doc.security = Some(vec![SecurityRequirement::new("bearer", Vec::<String>::new())]);

        let policy = AuthorizationPolicy::from_openapi(&doc);
        assert!(policy.demands(&Method::GET, "/items/{id}"));
    }
}
