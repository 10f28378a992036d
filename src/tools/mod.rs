//! External program invocation.
//!
//! Every collaborator of the ISBN pipeline (text extractors, rasterizers, OCR
//! engines, archivers, metadata readers) is an external program. They are all
//! reached through the [`ToolRunner`] trait so that the pipeline can be driven
//! by the real system ([`SystemRunner`]) or by a scripted runner in tests.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::ShellOutput;

pub mod system;
pub mod toolbox;

pub use system::SystemRunner;
pub use toolbox::{ToolPaths, Toolbox};

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
    /// When set, the program's stdout is written to this file instead of being captured.
    pub stdout_file: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_file: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends `prefix` immediately followed by `path` as one argument (`-o/tmp/x`).
    pub fn prefixed_arg(mut self, prefix: &str, path: &Path) -> Self {
        let mut arg = OsString::from(prefix);
        arg.push(path.as_os_str());
        self.args.push(arg);
        self
    }

    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout_file = Some(path.to_path_buf());
        self
    }

    /// Program followed by its arguments, lossily converted for logging and results.
    pub fn display_args(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect()
    }

    /// The arguments as UTF-8 strings, for inspection in logs and tests.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Runs external programs on behalf of the pipeline.
///
/// Implementations must block the calling task until the program exits; the
/// pipeline relies on strictly sequential execution.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Whether `program` can be run at all. Unavailable tools are skipped, never spawned.
    fn command_exists(&self, program: &str) -> bool;

    /// Runs `command` to completion and captures its result.
    ///
    /// # Returns
    /// * `Ok(ShellOutput)` - The program ran; success or failure is in the output
    /// * `Err(Error::ToolUnavailable)` - The program could not be started
    async fn run(&self, command: &ToolCommand) -> Result<ShellOutput>;
}
