use serde::{Deserialize, Serialize};
use std::path::Path;
use tempfile::{TempDir, TempPath};

use crate::error::{Error, Result};
use crate::tools::{ToolCommand, ToolRunner};
use crate::types::ShellOutput;

/// Program names (or full paths) of every external tool ebooktools may call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub pdftotext: String,
    pub catdoc: String,
    pub djvutxt: String,
    pub ebook_convert: String,
    pub ebook_meta: String,
    pub seven_zip: String,
    pub ghostscript: String,
    pub ddjvu: String,
    pub djvused: String,
    pub pdfinfo: String,
    pub tesseract: String,
    pub file: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pdftotext: "pdftotext".to_string(),
            catdoc: "catdoc".to_string(),
            djvutxt: "djvutxt".to_string(),
            ebook_convert: "ebook-convert".to_string(),
            ebook_meta: "ebook-meta".to_string(),
            seven_zip: "7z".to_string(),
            ghostscript: "gs".to_string(),
            ddjvu: "ddjvu".to_string(),
            djvused: "djvused".to_string(),
            pdfinfo: "pdfinfo".to_string(),
            tesseract: "tesseract".to_string(),
            file: "file".to_string(),
        }
    }
}

/// Typed access to the external collaborators through a [`ToolRunner`].
///
/// Each method builds one command line and runs it. None of them interpret
/// failure beyond what their return type states; deciding what a failure means
/// is left to the caller.
#[derive(Clone, Copy)]
pub struct Toolbox<'a> {
    runner: &'a dyn ToolRunner,
    paths: &'a ToolPaths,
    tmp_dir: Option<&'a Path>,
}

impl<'a> Toolbox<'a> {
    pub fn new(runner: &'a dyn ToolRunner, paths: &'a ToolPaths, tmp_dir: Option<&'a Path>) -> Self {
        Self {
            runner,
            paths,
            tmp_dir,
        }
    }

    pub fn paths(&self) -> &ToolPaths {
        self.paths
    }

    pub fn has(&self, program: &str) -> bool {
        self.runner.command_exists(program)
    }

    pub async fn run(&self, command: ToolCommand) -> Result<ShellOutput> {
        self.runner.run(&command).await
    }

    /// Creates an empty temporary file that is deleted when the returned path is dropped.
    pub fn temp_file(&self, prefix: &str, suffix: &str) -> Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix).suffix(suffix);
        let file = match self.tmp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file.into_temp_path())
    }

    /// Creates an empty temporary directory that is deleted when dropped.
    pub fn temp_dir(&self, prefix: &str) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        Ok(match self.tmp_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        })
    }

    // --- Text extraction ---

    pub async fn pdftotext(&self, input: &Path, output: &Path) -> Result<ShellOutput> {
        self.run(ToolCommand::new(&self.paths.pdftotext).arg(input).arg(output))
            .await
    }

    pub async fn catdoc(&self, input: &Path, output: &Path) -> Result<ShellOutput> {
        self.run(ToolCommand::new(&self.paths.catdoc).arg(input).stdout_to(output))
            .await
    }

    pub async fn djvutxt(&self, input: &Path, output: &Path) -> Result<ShellOutput> {
        self.run(ToolCommand::new(&self.paths.djvutxt).arg(input).arg(output))
            .await
    }

    pub async fn ebook_convert(&self, input: &Path, output: &Path) -> Result<ShellOutput> {
        self.run(
            ToolCommand::new(&self.paths.ebook_convert)
                .arg(input)
                .arg(output),
        )
        .await
    }

    // --- Metadata and archives ---

    pub async fn ebook_metadata(&self, input: &Path) -> Result<ShellOutput> {
        self.run(ToolCommand::new(&self.paths.ebook_meta).arg(input))
            .await
    }

    pub async fn seven_zip_extract(&self, archive: &Path, destination: &Path) -> Result<ShellOutput> {
        self.run(
            ToolCommand::new(&self.paths.seven_zip)
                .arg("x")
                .arg("-y")
                .prefixed_arg("-o", destination)
                .arg(archive),
        )
        .await
    }

    /// Asks `file` for the MIME type of `input`.
    pub async fn file_mime_type(&self, input: &Path) -> Result<String> {
        let output = self
            .run(
                ToolCommand::new(&self.paths.file)
                    .arg("--brief")
                    .arg("--mime-type")
                    .arg(input),
            )
            .await?;
        if !output.success() {
            return Err(Error::ToolFailed {
                tool: self.paths.file.clone(),
                message: output.stderr,
            });
        }
        output
            .stdout_first_token()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidToolOutput {
                tool: self.paths.file.clone(),
                output: output.stdout.clone(),
            })
    }

    // --- Page counting and rasterization ---

    /// Number of pages of a PDF, read from the `Pages:` line of `pdfinfo`.
    pub async fn pdf_page_count(&self, input: &Path) -> Result<u32> {
        let output = self
            .run(ToolCommand::new(&self.paths.pdfinfo).arg(input))
            .await?;
        log::debug!("Result of pdfinfo on {:?}: {}", input, output);
        if !output.success() {
            return Err(Error::ToolFailed {
                tool: self.paths.pdfinfo.clone(),
                message: output.stderr,
            });
        }

        output
            .stdout
            .lines()
            .find_map(|line| line.strip_prefix("Pages:"))
            .and_then(|count| count.trim().parse::<u32>().ok())
            .ok_or_else(|| Error::InvalidToolOutput {
                tool: self.paths.pdfinfo.clone(),
                output: output.stdout.clone(),
            })
    }

    /// Number of pages of a DjVu document, from `djvused -e n`.
    pub async fn djvu_page_count(&self, input: &Path) -> Result<u32> {
        let output = self
            .run(
                ToolCommand::new(&self.paths.djvused)
                    .arg("-e")
                    .arg("n")
                    .arg(input),
            )
            .await?;
        log::debug!("Result of djvused on {:?}: {}", input, output);
        if !output.success() {
            return Err(Error::ToolFailed {
                tool: self.paths.djvused.clone(),
                message: output.stderr,
            });
        }
        output.parse_stdout_u32()
    }

    pub async fn rasterize_pdf_page(&self, page: u32, input: &Path, output: &Path) -> Result<ShellOutput> {
        self.run(
            ToolCommand::new(&self.paths.ghostscript)
                .arg("-dSAFER")
                .arg("-q")
                .arg("-r300")
                .arg(format!("-dFirstPage={}", page))
                .arg(format!("-dLastPage={}", page))
                .arg("-dNOPAUSE")
                .arg("-dINTERPOLATE")
                .arg("-sDEVICE=png16m")
                .prefixed_arg("-sOutputFile=", output)
                .arg(input)
                .arg("-c")
                .arg("quit"),
        )
        .await
    }

    pub async fn rasterize_djvu_page(&self, page: u32, input: &Path, output: &Path) -> Result<ShellOutput> {
        self.run(
            ToolCommand::new(&self.paths.ddjvu)
                .arg(format!("-page={}", page))
                .arg("-format=tif")
                .arg(input)
                .arg(output),
        )
        .await
    }

    // --- OCR ---

    /// Runs tesseract on an image, writing the recognized text to `output`.
    pub async fn tesseract(&self, image: &Path, output: &Path) -> Result<ShellOutput> {
        self.run(
            ToolCommand::new(&self.paths.tesseract)
                .arg(image)
                .arg("stdout")
                .arg("--psm")
                .arg("12")
                .stdout_to(output),
        )
        .await
    }
}

impl std::fmt::Debug for Toolbox<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("paths", &self.paths)
            .field("tmp_dir", &self.tmp_dir)
            .finish()
    }
}
