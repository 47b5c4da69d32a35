// src/tool.rs

//! External tool invocation with timeout protection.
//!
//! Every external program the pipeline shells out to (the packaging CLI,
//! the compression utility, the rescue script) runs through here: stdin
//! nullified to prevent hangs, stdout/stderr captured and relayed to the
//! log, and a hard deadline after which the child is killed. A timeout is
//! reported as a [`Error::ToolInvocation`] like any other invocation
//! failure, so the selector falls through to the next strategy.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Deadline for a single external invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolve a tool on PATH, if installed.
pub fn resolve(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// A single external invocation, built up then run to completion.
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory for the child only; the parent process never
    /// changes its own.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run to completion. `label` names the tool in logs and errors.
    pub fn run(self, label: &str) -> Result<()> {
        debug!(
            "running {}: {} {:?}",
            label,
            self.program.display(),
            self.args
        );

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|err| Error::ToolInvocation(format!("failed to spawn {}: {}", label, err)))?;

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let output = child.wait_with_output()?;
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);

                for line in stdout.lines() {
                    debug!("[{}] {}", label, line);
                }
                for line in stderr.lines() {
                    warn!("[{}] {}", label, line);
                }

                if status.success() {
                    Ok(())
                } else {
                    let code = status.code().unwrap_or(-1);
                    Err(Error::ToolInvocation(format!(
                        "{} exited with code {}",
                        label, code
                    )))
                }
            }
            None => {
                let _ = child.kill();
                Err(Error::ToolInvocation(format!(
                    "{} timed out after {} seconds",
                    label,
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

/// Shorthand for a tool that exists on this host.
pub fn exists(name: &str) -> bool {
    resolve(name).is_some()
}
