//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] around an
//! explicit tool registry, so tests never depend on the host's ffmpeg. The
//! [`TestHarness::serve`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use camview::config::Config;
use camview::server::{create_router, AppContext};
use camview_av::{ToolRegistry, TRANSCODER};

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Default config and no transcoder installed.
    pub fn new() -> Self {
        Self::with_tools(Config::default(), ToolRegistry::default())
    }

    /// Default config with `transcoder` registered as ffmpeg.
    pub fn with_transcoder(transcoder: &Path) -> Self {
        let mut tools = ToolRegistry::default();
        tools.insert(TRANSCODER, transcoder);
        Self::with_tools(Config::default(), tools)
    }

    pub fn with_tools(config: Config, tools: ToolRegistry) -> Self {
        let ctx = AppContext::with_tools(config, Arc::new(tools));
        Self { ctx }
    }

    pub fn router(&self) -> Router {
        let static_dir = self.ctx.config.server.static_dir.clone();
        create_router(self.ctx.clone(), static_dir)
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn serve(self) -> (Self, SocketAddr) {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }
}

/// Write an executable `/bin/sh` script standing in for ffmpeg.
#[cfg(unix)]
pub fn fake_transcoder(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("stat script").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod script");
    path
}

/// True while `pid` names a live (or unreaped) process.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
