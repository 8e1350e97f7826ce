//! camview - live camera stream viewer backend
//!
//! This library crate exposes the config and HTTP layers for integration testing.

pub mod config;
pub mod server;
