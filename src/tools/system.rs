use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::tools::{ToolCommand, ToolRunner};
use crate::types::ShellOutput;

/// Runs tools as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ToolRunner for SystemRunner {
    fn command_exists(&self, program: &str) -> bool {
        find_executable(program).is_some()
    }

    async fn run(&self, command: &ToolCommand) -> Result<ShellOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped());

        match &command.stdout_file {
            Some(path) => {
                let file = fs::File::create(path).await?.into_std().await;
                cmd.stdout(Stdio::from(file));
            }
            None => {
                cmd.stdout(Stdio::piped());
            }
        }

        log::debug!("Running {:?}", command.display_args());
        let output = cmd.output().await.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                Error::ToolUnavailable(command.program.clone())
            }
            _ => Error::Io(e),
        })?;

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            return_code: output.status.code(),
            args: command.display_args(),
        })
    }
}

/// Locates `program` the way a shell would.
///
/// A program given with a directory component is checked directly, anything
/// else is looked up in each entry of `PATH`. Only regular files the current
/// platform can execute qualify.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path).find_map(|dir| {
        let full = dir.join(program);
        if is_executable(&full) {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = full.with_extension("exe");
            if is_executable(&exe) {
                return Some(exe);
            }
        }
        None
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_executable_missing() {
        assert!(find_executable("").is_none());
        assert!(find_executable("definitely-not-an-installed-tool-1b7f").is_none());
        assert!(find_executable("/nonexistent/dir/tool").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_executable_requires_exec_bit() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let tool = dir.path().join("pdftotext");
        std::fs::write(&tool, "#!/bin/sh\n")?;
        let name = tool.to_string_lossy().into_owned();

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644))?;
        assert!(find_executable(&name).is_none());

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755))?;
        assert_eq!(find_executable(&name), Some(tool));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_redirects_stdout_to_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("out.txt");
        let result = SystemRunner
            .run(&ToolCommand::new("echo").arg("page text").stdout_to(&output))
            .await?;

        assert!(result.success());
        assert!(result.stdout.is_empty());
        assert_eq!(tokio::fs::read_to_string(&output).await?, "page text\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_run_missing_program_is_unavailable() {
        let result = SystemRunner
            .run(&ToolCommand::new("definitely-not-an-installed-tool-1b7f"))
            .await;
        assert!(matches!(result, Err(Error::ToolUnavailable(_))));
    }
}
