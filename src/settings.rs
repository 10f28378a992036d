//! The TOML configuration file.
//!
//! Every key is optional. Values from the file are applied on top of the
//! built-in defaults, and command-line flags are applied on top of the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

use crate::ebooktools::{
    DEFAULT_ISBN_DIRECT_GREP_FILES, DEFAULT_ISBN_IGNORED_FILES, EbookToolsConfigBuilder,
};
use crate::error::{Error, Result};
use crate::isbn::{DEFAULT_ISBN_BLACKLIST_REGEX, DEFAULT_ISBN_REGEX, DEFAULT_ISBN_RET_SEPARATOR};
use crate::split::SplitOptions;
use crate::tools::ToolPaths;
use crate::types::{MimeDetection, OcrMode, PageRestriction, ReorderLines};

/// Name of the folder holding the configuration file.
pub const CONFIG_DIR_NAME: &str = "ebooktools";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// A pair of counts that can also be switched off with `false`.
///
/// In TOML: `key = [7, 3]`, `key = false`, or `key = true` for the default pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountPair {
    Switch(bool),
    Pair(u32, u32),
}

impl CountPair {
    /// The pair this value selects, `default` standing in for `true`.
    pub fn resolve(self, default: (u32, u32)) -> Option<(u32, u32)> {
        match self {
            CountPair::Switch(false) => None,
            CountPair::Switch(true) => Some(default),
            CountPair::Pair(first, last) => Some((first, last)),
        }
    }
}

/// Options of the `[split]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSection {
    pub output_folder: Option<PathBuf>,
    pub start_number: Option<u64>,
    pub folder_pattern: Option<String>,
    pub files_per_folder: Option<usize>,
    pub output_metadata_extension: Option<String>,
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub logging_level: Option<String>,
    pub logging_formatter: Option<String>,
    pub dry_run: Option<bool>,
    pub reverse: Option<bool>,

    pub isbn_regex: Option<String>,
    pub isbn_blacklist_regex: Option<String>,
    pub isbn_ret_separator: Option<String>,
    pub isbn_direct_grep_files: Option<String>,
    pub isbn_ignored_files: Option<String>,
    pub isbn_grep_reorder_files: Option<CountPair>,

    pub ocr_enabled: Option<OcrMode>,
    pub ocr_only_first_last_pages: Option<CountPair>,
    pub ocr_command: Option<String>,

    pub mime_detection: Option<MimeDetection>,
    pub tmp_dir: Option<PathBuf>,
    pub output_file: Option<PathBuf>,

    pub tools: Option<ToolPaths>,
    pub split: SplitSection,
}

impl ConfigFile {
    /// A file holding every built-in default, as written by `edit main --reset`.
    pub fn defaults() -> Self {
        let reorder = ReorderLines::default();
        Self {
            logging_level: Some("info".to_string()),
            logging_formatter: Some("only_msg".to_string()),
            dry_run: Some(false),
            reverse: Some(false),
            isbn_regex: Some(DEFAULT_ISBN_REGEX.to_string()),
            isbn_blacklist_regex: Some(DEFAULT_ISBN_BLACKLIST_REGEX.to_string()),
            isbn_ret_separator: Some(DEFAULT_ISBN_RET_SEPARATOR.to_string()),
            isbn_direct_grep_files: Some(DEFAULT_ISBN_DIRECT_GREP_FILES.to_string()),
            isbn_ignored_files: Some(DEFAULT_ISBN_IGNORED_FILES.to_string()),
            isbn_grep_reorder_files: Some(CountPair::Pair(
                reorder.scan_first as u32,
                reorder.reverse_last as u32,
            )),
            ocr_enabled: Some(OcrMode::Disabled),
            ocr_only_first_last_pages: Some(CountPair::Pair(7, 3)),
            ocr_command: Some("tesseract".to_string()),
            mime_detection: Some(MimeDetection::Extension),
            tmp_dir: None,
            output_file: Some(PathBuf::from("output.txt")),
            tools: Some(ToolPaths::default()),
            split: SplitSection {
                output_folder: None,
                start_number: Some(0),
                folder_pattern: Some("%05d000".to_string()),
                files_per_folder: Some(1000),
                output_metadata_extension: Some("meta".to_string()),
            },
        }
    }

    /// Default location: `<config dir>/ebooktools/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::NotFound("No configuration directory on this platform".to_string()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn render(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Loads `path`, or the default file when no path is given.
    ///
    /// A missing default file yields an empty configuration; a missing
    /// explicit file is an error.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::NotFound(format!(
                        "Configuration file does not exist: {:?}",
                        path
                    )));
                }
                Self::load(path).await
            }
            None => {
                let path = Self::default_path()?;
                if path.is_file() {
                    Self::load(&path).await
                } else {
                    log::debug!("No configuration file at {:?}, using the defaults", path);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Writes the built-in defaults to `path`, replacing any existing file.
    pub async fn reset(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, Self::defaults().render()?).await?;
        log::info!("The configuration file {:?} was reset to the defaults", path);
        Ok(())
    }

    /// Applies the values present in the file to `builder`.
    pub fn apply(&self, builder: &mut EbookToolsConfigBuilder) {
        if let Some(v) = &self.isbn_regex {
            builder.isbn_regex(v.clone());
        }
        if let Some(v) = &self.isbn_blacklist_regex {
            builder.isbn_blacklist_regex(v.clone());
        }
        if let Some(v) = &self.isbn_ret_separator {
            builder.isbn_ret_separator(v.clone());
        }
        if let Some(v) = &self.isbn_direct_grep_files {
            builder.isbn_direct_grep_files(v.clone());
        }
        if let Some(v) = &self.isbn_ignored_files {
            builder.isbn_ignored_files(v.clone());
        }
        if let Some(v) = self.isbn_grep_reorder_files {
            let default = ReorderLines::default();
            let order = v
                .resolve((default.scan_first as u32, default.reverse_last as u32))
                .map(|(first, last)| ReorderLines::new(first as usize, last as usize));
            builder.isbn_grep_reorder_files(order);
        }
        if let Some(v) = self.ocr_enabled {
            builder.ocr_enabled(v);
        }
        if let Some(v) = self.ocr_only_first_last_pages {
            let pages = v
                .resolve((7, 3))
                .map(|(first, last)| PageRestriction::new(first, last));
            builder.ocr_only_first_last_pages(pages);
        }
        if let Some(v) = &self.ocr_command {
            builder.ocr_command(v.clone());
        }
        if let Some(v) = self.mime_detection {
            builder.mime_detection(v);
        }
        if let Some(v) = &self.tmp_dir {
            builder.tmp_dir(v.clone());
        }
        if let Some(v) = &self.tools {
            builder.tool_paths(v.clone());
        }
    }

    /// Split options from the `[split]` table and the general flags.
    pub fn split_options(&self) -> SplitOptions {
        let mut options = SplitOptions::default();
        let section = &self.split;
        if let Some(v) = &section.output_folder {
            options.output_folder = v.clone();
        }
        if let Some(v) = section.start_number {
            options.start_number = v;
        }
        if let Some(v) = &section.folder_pattern {
            options.folder_pattern = v.clone();
        }
        if let Some(v) = section.files_per_folder {
            options.files_per_folder = v;
        }
        if let Some(v) = &section.output_metadata_extension {
            options.output_metadata_extension = v.clone();
        }
        options.dry_run = self.dry_run.unwrap_or(false);
        options.reverse = self.reverse.unwrap_or(false);
        options
    }
}

/// Opens the configuration file in an editor, creating it with the defaults first if needed.
///
/// The editor is `app` when given, then `$EDITOR`, then the platform opener.
pub async fn edit_file(path: &Path, app: Option<&str>) -> Result<()> {
    if !path.exists() {
        ConfigFile::reset(path).await?;
    }

    let editor = app
        .map(str::to_string)
        .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
        .unwrap_or_else(|| default_opener().to_string());
    log::info!("Opening {:?} with {}", path, editor);

    let status = Command::new(&editor).arg(path).status().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ToolUnavailable(editor.clone())
        } else {
            Error::Io(e)
        }
    })?;
    if !status.success() {
        return Err(Error::ToolFailed {
            tool: editor,
            message: format!("exited with {}", status),
        });
    }
    Ok(())
}

fn default_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "notepad"
    } else {
        "xdg-open"
    }
}
