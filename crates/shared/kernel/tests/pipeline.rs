use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use selfhost_kernel::domain::build::BuildInfo;
use selfhost_kernel::domain::config::HostEnvironment;
use selfhost_kernel::server::docs::describe;
use selfhost_kernel::server::{ApiState, Controllers, Pipeline};
use tower::ServiceExt;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

#[utoipa::path(get, path = "/items", responses((status = 200, description = "All items")))]
async fn list_items() -> &'static str {
    "[]"
}

#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = u32, Path, description = "Item id")),
    responses((status = 204, description = "Deleted")),
    security(("bearer" = []))
)]
async fn delete_item(axum::extract::Path(_id): axum::extract::Path<u32>) -> StatusCode {
    StatusCode::NO_CONTENT
}

#[utoipa::path(get, path = "/boom", responses((status = 200, description = "Never")))]
async fn boom() -> &'static str {
    panic!("inventory ledger is corrupt")
}

fn app(environment: HostEnvironment) -> Router {
    let build = BuildInfo::new("pipeline-test", "3.2.1");
    let controllers = Controllers::new()
        .add(OpenApiRouter::new().routes(routes!(list_items)).routes(routes!(delete_item)))
        .add(OpenApiRouter::new().routes(routes!(boom)));

    let (endpoints, document) = describe(&build, controllers, None);
    Pipeline::for_environment(&environment)
        .assemble(ApiState::default(), endpoints, &document)
        .expect("pipeline should assemble")
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn open_route_is_dispatched() {
    let (status, body) = send(app(HostEnvironment::production()), "GET", "/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn route_demanding_authorization_is_denied() {
    let (status, body) = send(app(HostEnvironment::production()), "DELETE", "/items/7").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Unauthorized"));
}

#[tokio::test]
async fn unknown_route_is_not_found_before_authorization() {
    let (status, _) = send(app(HostEnvironment::production()), "GET", "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn documentation_is_not_gated() {
    let app = app(HostEnvironment::production());

    let (status, body) = send(app.clone(), "GET", "/swagger/v1/swagger.json").await;
    assert_eq!(status, StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_str(&body).expect("document is JSON");
    assert_eq!(doc["info"]["title"], "pipeline-test");
    assert_eq!(doc["info"]["version"], "v3.2.1");
    assert!(doc["paths"]["/items/{id}"]["delete"]["security"].is_array());

    let (status, page) = send(app, "GET", "/swagger").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("<html"), "interactive page should be HTML");
}

#[tokio::test]
async fn production_error_hides_stack_trace() {
    let (status, body) = send(app(HostEnvironment::production()), "GET", "/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("inventory ledger is corrupt"));
    assert!(!body.contains("Stack trace"));
    assert!(body.contains("Internal Server Error"));
}

#[tokio::test]
async fn development_error_shows_stack_trace() {
    let (status, body) = send(app(HostEnvironment::development()), "GET", "/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("inventory ledger is corrupt"));
    assert!(body.contains("Stack trace"));
    assert!(body.contains("pipeline.rs"), "location should point at the panicking handler");
}

#[tokio::test]
async fn pipeline_without_controllers_still_serves_documentation() {
    let build = BuildInfo::new("empty", "0.0.1");
    let (endpoints, document) = describe(&build, Controllers::new(), None);
    let app = Pipeline::for_environment(&HostEnvironment::production())
        .assemble(ApiState::default(), endpoints, &document)
        .expect("pipeline should assemble");

    let (status, body) = send(app, "GET", "/swagger/v1/swagger.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"v0.0.1\""));
}
