//! # Domain Models
//!
//! This crate contains plain data types with a single dependency (`serde`).
//! Keep it lean: data and simple helpers only, no I/O.

pub mod build;
pub mod config;
pub mod constants;
