//! Common test utilities for the ebooktools crate.
//!
//! Provides scratch directories, a scripted `ToolRunner` that records every
//! command it is asked to run, and fixture builders.

use async_trait::async_trait;
use ebooktools::error::{Error, Result};
use ebooktools::prelude::*;
use rand::{Rng, distributions::Alphanumeric};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Scratch directories of one test.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    /// Handed to the configuration as its temporary folder.
    pub tmp_dir: PathBuf,
}

/// Helper function to create a clean, uniquely named test directory.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let source_dir = test_dir.join("source");
    let target_dir = test_dir.join("target");
    let tmp_dir = test_dir.join("tmp");

    fs::create_dir_all(&source_dir).await.unwrap();
    fs::create_dir_all(&target_dir).await.unwrap();
    fs::create_dir_all(&tmp_dir).await.unwrap();

    TestDirs {
        test_dir,
        source_dir,
        target_dir,
        tmp_dir,
    }
}

/// Number of entries left in a directory.
#[allow(dead_code)]
pub async fn count_entries(dir: &Path) -> usize {
    let mut entries = fs::read_dir(dir).await.unwrap();
    let mut count = 0;
    while entries.next_entry().await.unwrap().is_some() {
        count += 1;
    }
    count
}

type Handler = Box<dyn Fn(&ToolCommand) -> ShellOutput + Send + Sync>;

/// A `ToolRunner` that plays scripted tools and records every call.
///
/// Tools are unavailable unless registered. A registered tool without a
/// handler succeeds with empty output. When a command redirects its stdout to
/// a file, the handler's stdout is written there, like a shell redirect.
#[derive(Default)]
pub struct FakeRunner {
    available: HashSet<String>,
    handlers: HashMap<String, Handler>,
    calls: Mutex<Vec<ToolCommand>>,
}

#[allow(dead_code)]
impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `program` as installed, answering with `handler`.
    pub fn with_tool<F>(mut self, program: &str, handler: F) -> Self
    where
        F: Fn(&ToolCommand) -> ShellOutput + Send + Sync + 'static,
    {
        self.available.insert(program.to_string());
        self.handlers.insert(program.to_string(), Box::new(handler));
        self
    }

    /// Registers `program` as installed, always succeeding silently.
    pub fn with_available(mut self, program: &str) -> Self {
        self.available.insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    pub fn calls_to(&self, program: &str) -> Vec<ToolCommand> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    fn command_exists(&self, program: &str) -> bool {
        self.available.contains(program)
    }

    async fn run(&self, command: &ToolCommand) -> Result<ShellOutput> {
        self.calls.lock().unwrap().push(command.clone());
        if !self.available.contains(&command.program) {
            return Err(Error::ToolUnavailable(command.program.clone()));
        }

        let mut output = match self.handlers.get(&command.program) {
            Some(handler) => handler(command),
            None => ok(""),
        };
        output.args = command.display_args();
        if let Some(path) = &command.stdout_file {
            std::fs::write(path, &output.stdout)?;
            output.stdout.clear();
        }
        Ok(output)
    }
}

/// A successful tool result printing `stdout`.
#[allow(dead_code)]
pub fn ok(stdout: &str) -> ShellOutput {
    ShellOutput {
        stdout: stdout.to_string(),
        return_code: Some(0),
        ..Default::default()
    }
}

/// A failed tool result printing `stderr`.
#[allow(dead_code)]
pub fn failed(stderr: &str) -> ShellOutput {
    ShellOutput {
        stderr: stderr.to_string(),
        return_code: Some(1),
        ..Default::default()
    }
}

/// Handler of tools called as `tool IN OUT`: writes `text` to OUT.
#[allow(dead_code)]
pub fn writes_output(text: &'static str) -> impl Fn(&ToolCommand) -> ShellOutput + Send + Sync {
    move |command| {
        let output = command.args.last().expect("output argument");
        std::fs::write(output, text).unwrap();
        ok("")
    }
}

/// Builds a configuration that runs `runner` and keeps temporary files in `tmp_dir`.
#[allow(dead_code)]
pub fn config_builder(runner: &Arc<FakeRunner>, tmp_dir: &Path) -> EbookToolsConfigBuilder {
    let runner: Arc<dyn ToolRunner> = runner.clone();
    let mut builder = EbookToolsConfig::builder();
    builder.tool_runner(runner).tmp_dir(tmp_dir.to_path_buf());
    builder
}

/// Writes a ZIP archive with the given `(name, content)` entries.
#[allow(dead_code)]
pub fn create_zip(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}
