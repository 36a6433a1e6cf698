//! HTTP pipeline building blocks.
//!
//! The web host is wired in two phases:
//! * **services**: [`Controllers`] collect routes, [`docs`] builds the `OpenAPI`
//!   document (with optional [`DocComments`]) and derives the [`AuthorizationPolicy`];
//! * **middleware**: [`Pipeline`] assembles the ordered [`Stage`]s into a router.

pub mod authorization;
pub mod controllers;
pub mod docs;
pub mod exception;
pub mod pipeline;
pub mod state;

pub use authorization::AuthorizationPolicy;
pub use controllers::Controllers;
pub use docs::{DocComments, DocsError, DocsErrorExt};
pub use pipeline::{Pipeline, Stage};
pub use state::ApiState;
