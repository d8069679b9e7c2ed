//! External programs the pipeline drives: yt-dlp, demucs and ffmpeg.
//!
//! Every process goes through a [`CommandRunner`], so callers can swap the
//! real process launcher for a recording double.

mod downloader;
mod remuxer;
mod separator;

use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};

use log::{debug, info};

pub use downloader::download_video;
pub use remuxer::{remux_mix, remux_multichannel};
pub use separator::{find_stem_dir, resolve_device, separate_stems, Separation};

use crate::error::{Result, StemError};

/// One external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Short tool name used in diagnostics, e.g. `"ffmpeg"`.
    pub tool: String,
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(tool: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Arguments as display strings.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in self.args_lossy() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

/// Captured output of a successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an [`Invocation`] to completion and captures its output.
///
/// A non-zero exit must surface as [`StemError::ExternalTool`] carrying the
/// program's diagnostic text.
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;
}

/// [`CommandRunner`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        info!("running {}", invocation.command_line());

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| {
                StemError::tool(
                    &invocation.tool,
                    format!("could not start {}: {}", invocation.program, err),
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let diagnostic = stderr.trim();
            let message = if diagnostic.is_empty() {
                format!("{} exited with {}", invocation.program, output.status)
            } else {
                diagnostic.to_string()
            };
            return Err(StemError::tool(&invocation.tool, message));
        }

        debug!(
            "{} finished ({} bytes stdout, {} bytes stderr)",
            invocation.tool,
            stdout.len(),
            stderr.len()
        );
        Ok(ToolOutput { stdout, stderr })
    }
}
