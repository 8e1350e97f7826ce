//! Builder for spawning external tool processes with piped output.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

/// A builder for constructing and spawning external tool invocations.
///
/// # Example
///
/// ```no_run
/// use camview_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # fn example() -> camview_common::Result<()> {
/// let child = ToolCommand::new(PathBuf::from("ffmpeg"))
///     .arg("-i").arg("rtsp://10.0.0.5/stream")
///     .args(["-f", "mp4", "pipe:1"])
///     .spawn_piped()?;
/// # drop(child);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// File name of the program, for log and error messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Spawn the process with stdout and stderr piped and stdin closed.
    ///
    /// The child is killed if its handle is dropped, so a panicking owner
    /// cannot leak it.
    ///
    /// # Errors
    ///
    /// Returns [`camview_common::Error::Tool`] if spawning the process fails.
    pub fn spawn_piped(&self) -> camview_common::Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| camview_common::Error::tool(self.program_name(), format!("failed to spawn: {e}")))
    }
}
