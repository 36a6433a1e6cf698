//! `OpenAPI` document generation.
//!
//! One document (`v1`) is generated at startup. Its title and version come from
//! the executing binary's [`BuildInfo`]; per-endpoint descriptions may be
//! supplied by a documentation-comment file placed next to the binary:
//!
//! ```json
//! {
//!   "description": "Inventory API",
//!   "operations": {
//!     "list_items": { "summary": "List items", "description": "Returns all items." },
//!     "GET /items/{id}": { "summary": "Get one item" }
//!   }
//! }
//! ```
//!
//! Operations are matched by `operationId` first, then by `"<METHOD> <path>"`.

use super::controllers::Controllers;
use super::state::ApiState;
use crate::error::format_context;
use axum::Router;
use axum::http::Method;
use selfhost_domain::build::BuildInfo;
use selfhost_domain::constants::DOCS_FILE_SUFFIX;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use utoipa::openapi::path::{Operation, PathItem};
use utoipa::openapi::{Info, OpenApi, Paths};
use utoipa_axum::router::OpenApiRouter;

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// The documentation-comment file exists but cannot be read.
    #[error("Documentation file I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// The documentation-comment file is not valid JSON of the expected shape.
    #[error("Documentation file parse error{}: {source}", format_context(.context))]
    Parse { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// The generated document cannot be serialized.
    #[error("OpenAPI document render error{}: {source}", format_context(.context))]
    Render { source: serde_json::Error, context: Option<Cow<'static, str>> },
}

pub trait DocsErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, DocsError>;
}

impl<T> DocsErrorExt<T> for Result<T, DocsError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                DocsError::Io { context: c, .. }
                | DocsError::Parse { context: c, .. }
                | DocsError::Render { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

/// Creates the empty `v1` document described by the binary's metadata.
pub fn openapi_document(build: &BuildInfo) -> OpenApi {
    OpenApi::new(Info::new(build.name.to_string(), build.api_version()), Paths::new())
}

/// Routes the controllers and describes them in the `v1` document.
///
/// Comments, when present, are merged after the operations are collected.
pub fn describe(
    build: &BuildInfo,
    controllers: Controllers,
    comments: Option<&DocComments>,
) -> (Router<ApiState>, OpenApi) {
    let (router, mut doc) = OpenApiRouter::with_openapi(openapi_document(build))
        .merge(controllers.into_router())
        .split_for_parts();

    if let Some(comments) = comments {
        comments.apply(&mut doc);
    }

    debug!(paths = doc.paths.paths.len(), "OpenAPI document generated");
    (router, doc)
}

/// Serializes the document once for the JSON endpoint.
pub fn render_json(doc: &OpenApi) -> Result<String, DocsError> {
    doc.to_pretty_json().map_err(|source| DocsError::Render { source, context: None })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OperationDoc {
    pub summary: Option<String>,
    pub description: Option<String>,
}

/// Descriptions merged into the generated document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DocComments {
    pub description: Option<String>,
    pub operations: BTreeMap<String, OperationDoc>,
}

impl DocComments {
    /// `<binary-name>.docs.json` in the directory of the running executable.
    pub fn default_path(build: &BuildInfo) -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join(format!("{}.{DOCS_FILE_SUFFIX}", build.name)))
    }

    /// Reads the file if it exists.
    ///
    /// A missing file is not an error and yields `Ok(None)`.
    ///
    /// # Errors
    /// Returns [`DocsError::Io`] if the file exists but cannot be read and
    /// [`DocsError::Parse`] if its content is malformed.
    pub fn load(path: &Path) -> Result<Option<Self>, DocsError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No documentation-comment file, skipping");
                return Ok(None);
            }
            Err(source) => {
                return Err(DocsError::Io {
                    source,
                    context: Some(format!("Failed to read {}", path.display()).into()),
                });
            }
        };

        let comments = serde_json::from_str::<Self>(&raw).map_err(|source| DocsError::Parse {
            source,
            context: Some(format!("Malformed documentation file {}", path.display()).into()),
        })?;

        info!(
            path = %path.display(),
            operations = comments.operations.len(),
            "Loaded documentation comments"
        );
        Ok(Some(comments))
    }

    /// Merges the descriptions into `doc`; provided values replace generated ones.
    pub fn apply(&self, doc: &mut OpenApi) {
        if let Some(description) = &self.description {
            doc.info.description = Some(description.clone());
        }

        for (path, item) in &mut doc.paths.paths {
            for (method, operation) in operations_mut(item) {
                let by_id = operation.operation_id.as_deref().and_then(|id| self.operations.get(id));
                let Some(entry) = by_id.or_else(|| self.operations.get(&format!("{method} {path}")))
                else {
                    continue;
                };

                if let Some(summary) = &entry.summary {
                    operation.summary = Some(summary.clone());
                }
                if let Some(description) = &entry.description {
                    operation.description = Some(description.clone());
                }
            }
        }
    }
}

pub(crate) fn operations(item: &PathItem) -> impl Iterator<Item = (Method, &Operation)> {
    [
        (Method::GET, item.get.as_ref()),
        (Method::PUT, item.put.as_ref()),
        (Method::POST, item.post.as_ref()),
        (Method::DELETE, item.delete.as_ref()),
        (Method::OPTIONS, item.options.as_ref()),
        (Method::HEAD, item.head.as_ref()),
        (Method::PATCH, item.patch.as_ref()),
        (Method::TRACE, item.trace.as_ref()),
    ]
    .into_iter()
    .filter_map(|(method, operation)| operation.map(|operation| (method, operation)))
}

fn operations_mut(item: &mut PathItem) -> impl Iterator<Item = (Method, &mut Operation)> {
    [
        (Method::GET, item.get.as_mut()),
        (Method::PUT, item.put.as_mut()),
        (Method::POST, item.post.as_mut()),
        (Method::DELETE, item.delete.as_mut()),
        (Method::OPTIONS, item.options.as_mut()),
        (Method::HEAD, item.head.as_mut()),
        (Method::PATCH, item.patch.as_mut()),
        (Method::TRACE, item.trace.as_mut()),
    ]
    .into_iter()
    .filter_map(|(method, operation)| operation.map(|operation| (method, operation)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_describes_binary() {
        let doc = openapi_document(&BuildInfo::new("inventory", "2.1.0"));
        assert_eq!(doc.info.title, "inventory");
        assert_eq!(doc.info.version, "v2.1.0");
        assert!(doc.paths.paths.is_empty());
    }

    #[test]
    fn test_comments_parse_with_missing_sections() {
        let comments: DocComments = serde_json::from_str(r#"{ "description": "d" }"#)
            .expect("partial file should parse");
        assert_eq!(comments.description.as_deref(), Some("d"));
        assert!(comments.operations.is_empty());
    }

    #[test]
    fn test_default_path_uses_binary_name() {
        let path = DocComments::default_path(&BuildInfo::new("inventory", "1.0.0"))
            .expect("test executable has a parent directory");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("inventory.docs.json"));
    }
}
