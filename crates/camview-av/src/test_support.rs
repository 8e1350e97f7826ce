//! Fake transcoder scripts for process-level tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::tools::{ToolRegistry, TRANSCODER};

/// Writes a line every 50ms until killed.
pub(crate) const ENDLESS: &str = "while true; do echo chunk; sleep 0.05; done";

/// Prints its own argument list once and exits.
pub(crate) const ECHO_ARGS: &str = r#"echo "$@""#;

/// Prints the `-i` argument twenty times, then exits.
pub(crate) const ECHO_SOURCE: &str = r#"
while [ "$#" -gt 0 ]; do
  if [ "$1" = "-i" ]; then src="$2"; fi
  shift
done
i=0
while [ "$i" -lt 20 ]; do
  echo "$src"
  i=$((i + 1))
  sleep 0.01
done
"#;

/// Write an executable `/bin/sh` script standing in for ffmpeg.
pub(crate) fn fake_transcoder(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

pub(crate) fn registry_with(path: PathBuf) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::default();
    registry.insert(TRANSCODER, path);
    Arc::new(registry)
}
