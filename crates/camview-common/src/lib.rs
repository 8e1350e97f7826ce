//! Common types and utilities for camview.
//!
//! This crate provides the foundational types shared across the camview
//! crates:
//!
//! - [`Error`] / [`Result`] -- unified error type with HTTP status mapping
//! - [`StreamEndpoint`] / [`Scheme`] -- validated stream endpoints and the
//!   [`resolve`] function that produces them
//! - [`SessionId`] -- typed identifier for a transcode session

pub mod endpoint;
pub mod error;
pub mod ids;

pub use endpoint::{resolve, Scheme, StreamEndpoint};
pub use error::{Error, Result};
pub use ids::SessionId;
