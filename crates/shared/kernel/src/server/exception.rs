//! Exception boundary for unhandled request errors (handler panics).
//!
//! * Development: the developer exception page renders the panic message, its
//!   source location and the stack trace captured when the panic fired.
//! * Any other environment: a generic `500` JSON body without details.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;
use std::any::Any;
use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::cell::RefCell;
use std::sync::Once;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

#[derive(Debug)]
struct PanicReport {
    location: Option<String>,
    backtrace: String,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static CAPTURE: Once = Once::new();

/// Chains a panic hook that records the location and stack trace of the last
/// panic on the current thread. The previous hook still runs.
pub fn install_panic_capture() {
    CAPTURE.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let report = PanicReport {
                location: info.location().map(ToString::to_string),
                backtrace: Backtrace::force_capture().to_string(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(report));
            previous(info);
        }));
    });
}

/// Outermost layer of the pipeline.
pub fn exception_boundary(developer: bool) -> CatchPanicLayer<PanicHandler> {
    let handler: PanicHandler = if developer {
        install_panic_capture();
        developer_exception_page
    } else {
        default_error_response
    };
    CatchPanicLayer::custom(handler)
}

/// Renders the panic with its stack trace.
pub fn developer_exception_page(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    let report = LAST_PANIC.with(|slot| slot.borrow_mut().take());
    error!(panic = %message, "Unhandled error while processing request");

    let (location, backtrace) = report.map_or_else(
        || (Cow::Borrowed("unknown"), Cow::Borrowed("<stack trace unavailable>")),
        |r| {
            (
                r.location.map_or(Cow::Borrowed("unknown"), Cow::Owned),
                Cow::Owned(r.backtrace),
            )
        },
    );

    let mut page = String::with_capacity(backtrace.len() + 512);
    page.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    page.push_str("<title>Internal Server Error</title></head><body>");
    page.push_str("<h1>An unhandled exception occurred while processing the request.</h1>");
    page.push_str(&format!("<h2>{}</h2>", escape_html(&message)));
    page.push_str(&format!("<p>Location: <code>{}</code></p>", escape_html(&location)));
    page.push_str(&format!("<h3>Stack trace</h3><pre>{}</pre>", escape_html(&backtrace)));
    page.push_str("</body></html>");

    (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response()
}

/// Generic response; details stay in the log.
pub fn default_error_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    error!(panic = %message, "Unhandled error while processing request");

    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Internal Server Error" })))
        .into_response()
}

fn panic_message(payload: &(dyn Any + Send)) -> Cow<'_, str> {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        Cow::Borrowed(s.as_str())
    } else {
        Cow::Borrowed("Box<dyn Any>")
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "Box<dyn Any>");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[tokio::test]
    async fn test_developer_page_sections() {
        let response = developer_exception_page(Box::new("ledger <corrupt>"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let page = String::from_utf8_lossy(&body);

        assert!(page.contains("<h2>ledger &lt;corrupt&gt;</h2>"));
        assert!(page.contains("<p>Location: <code>unknown</code></p>"));
        assert!(page.contains("<h3>Stack trace</h3><pre>&lt;stack trace unavailable&gt;</pre>"));
        assert!(page.ends_with("</body></html>"));
    }

    #[test]
    fn test_default_response_hides_details() {
        let response = default_error_response(Box::new("secret detail"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
