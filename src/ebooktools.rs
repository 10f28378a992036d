use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::convert::convert_file;
use crate::error::{Error, Result};
use crate::isbn::{
    DEFAULT_ISBN_BLACKLIST_REGEX, DEFAULT_ISBN_REGEX, DEFAULT_ISBN_RET_SEPARATOR, IsbnList,
    IsbnMatcher,
};
use crate::ocr::{OcrOptions, ocr_file};
use crate::pipeline::{IsbnSearch, SearchOptions, detect_mime_type};
use crate::tools::{SystemRunner, ToolPaths, ToolRunner, Toolbox};
use crate::types::{MimeDetection, OcrMode, OcrStatus, PageRestriction, ReorderLines};

/// MIME types whose contents are searched for ISBNs directly.
pub const DEFAULT_ISBN_DIRECT_GREP_FILES: &str = "^text/(plain|xml|html)$";

/// MIME types that are never searched.
pub const DEFAULT_ISBN_IGNORED_FILES: &str = "^(image/(gif|svg.+)|application/(x-shockwave-flash|CDFV2|vnd.ms-opentype|x-font-ttf|x-dosexec|vnd.ms-excel|x-java-applet)|audio/.+|video/.+)$";

/// Runner used when the configuration does not provide one.
static SYSTEM_RUNNER: SystemRunner = SystemRunner;

/// The ebooktools configuration, built declaratively using the builder pattern.
///
/// This struct holds every option of the ISBN search, conversion and OCR
/// operations. Once built it exposes them as entry points:
///
/// - [`find`](EbookToolsConfig::find): ISBNs of a file, or of a string
/// - [`search_file_for_isbns`](EbookToolsConfig::search_file_for_isbns): the full search pipeline on one file
/// - [`convert`](EbookToolsConfig::convert): conversion to text with OCR fallback
/// - [`ocr_file`](EbookToolsConfig::ocr_file): OCR only
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use ebooktools::prelude::*;
/// let config = EbookToolsConfig::builder()
///     .ocr_enabled(OcrMode::Enabled)
///     .ocr_only_first_last_pages(PageRestriction::new(7, 3))
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EbookToolsConfig {
    // --- ISBN extraction ---
    /// Pattern of ISBN-like sequences. Digit boundaries are enforced by the matcher.
    #[builder(default = "DEFAULT_ISBN_REGEX.to_string()")]
    pub isbn_regex: String,

    /// Valid ISBNs matching this pattern are dropped. Empty disables the blacklist.
    #[builder(default = "DEFAULT_ISBN_BLACKLIST_REGEX.to_string()")]
    pub isbn_blacklist_regex: String,

    /// Separator placed between ISBNs in textual results.
    #[builder(default = "DEFAULT_ISBN_RET_SEPARATOR.to_string()")]
    pub isbn_ret_separator: String,

    /// MIME types searched directly; a search of such a file ends after its contents.
    #[builder(default = "DEFAULT_ISBN_DIRECT_GREP_FILES.to_string()")]
    pub isbn_direct_grep_files: String,

    /// MIME types for which the search stops right away.
    #[builder(default = "DEFAULT_ISBN_IGNORED_FILES.to_string()")]
    pub isbn_ignored_files: String,

    /// Line reordering applied to text before it is searched. `None` disables it.
    #[builder(default = "Some(ReorderLines::default())")]
    pub isbn_grep_reorder_files: Option<ReorderLines>,

    // --- OCR ---
    #[builder(default)]
    pub ocr_enabled: OcrMode,

    /// Only OCR the first and last pages of paginated documents. `None` OCRs every page.
    #[builder(default = "Some(PageRestriction::new(7, 3))")]
    pub ocr_only_first_last_pages: Option<PageRestriction>,

    /// OCR backend identifier, `tesseract` by default.
    #[builder(default = "\"tesseract\".to_string()")]
    pub ocr_command: String,

    // --- Environment ---
    #[builder(default)]
    pub mime_detection: MimeDetection,

    /// Program names or paths of the external tools.
    #[builder(default)]
    pub tool_paths: ToolPaths,

    /// Folder for temporary files; the system temporary folder when unset.
    #[builder(default)]
    pub tmp_dir: Option<PathBuf>,

    /// Runs the external tools. Real processes are spawned when unset.
    #[builder(default)]
    pub tool_runner: Option<Arc<dyn ToolRunner>>,
}

impl std::fmt::Debug for EbookToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EbookToolsConfig")
            .field("isbn_regex", &self.isbn_regex)
            .field("isbn_blacklist_regex", &self.isbn_blacklist_regex)
            .field("isbn_ret_separator", &self.isbn_ret_separator)
            .field("isbn_direct_grep_files", &self.isbn_direct_grep_files)
            .field("isbn_ignored_files", &self.isbn_ignored_files)
            .field("isbn_grep_reorder_files", &self.isbn_grep_reorder_files)
            .field("ocr_enabled", &self.ocr_enabled)
            .field("ocr_only_first_last_pages", &self.ocr_only_first_last_pages)
            .field("ocr_command", &self.ocr_command)
            .field("mime_detection", &self.mime_detection)
            .field("tool_paths", &self.tool_paths)
            .field("tmp_dir", &self.tmp_dir)
            .field(
                "tool_runner",
                if self.tool_runner.is_some() {
                    &"Some(Custom)"
                } else {
                    &"System"
                },
            )
            .finish()
    }
}

impl EbookToolsConfig {
    /// Creates a new builder for configuring `EbookToolsConfig`.
    pub fn builder() -> EbookToolsConfigBuilder {
        EbookToolsConfigBuilder::default()
    }

    /// The runner external tools are started with.
    pub fn runner(&self) -> &dyn ToolRunner {
        match &self.tool_runner {
            Some(runner) => runner.as_ref(),
            None => &SYSTEM_RUNNER,
        }
    }

    /// Typed access to the configured external tools.
    pub fn toolbox(&self) -> Toolbox<'_> {
        Toolbox::new(self.runner(), &self.tool_paths, self.tmp_dir.as_deref())
    }

    /// Compiles the ISBN matcher of this configuration.
    pub fn isbn_matcher(&self) -> Result<IsbnMatcher> {
        let blacklist = Some(self.isbn_blacklist_regex.as_str()).filter(|b| !b.is_empty());
        IsbnMatcher::new(&self.isbn_regex, blacklist)
    }

    pub fn ocr_options(&self) -> OcrOptions {
        OcrOptions {
            mode: self.ocr_enabled,
            command: self.ocr_command.clone(),
            pages: self.ocr_only_first_last_pages,
        }
    }

    /// Compiles everything the search pipeline needs.
    pub fn search_options(&self) -> Result<SearchOptions> {
        Ok(SearchOptions {
            matcher: self.isbn_matcher()?,
            direct_grep_files: Regex::new(&self.isbn_direct_grep_files)?,
            ignored_files: Regex::new(&self.isbn_ignored_files)?,
            reorder: self.isbn_grep_reorder_files,
            ocr: self.ocr_options(),
            mime_detection: self.mime_detection,
        })
    }

    /// Extracts the valid ISBNs of `text`, joined with the configured separator.
    pub fn find_isbns(&self, text: &str) -> Result<String> {
        Ok(self
            .isbn_matcher()?
            .find_isbns(text)
            .join(&self.isbn_ret_separator))
    }

    /// Runs the full ISBN search pipeline on one file.
    ///
    /// # Returns
    ///
    /// * `Ok(IsbnList)` - The ISBNs found, possibly none
    /// * `Err(Error)` - The file does not exist, or an unexpected filesystem error occurred
    pub async fn search_file_for_isbns(&self, path: &Path) -> Result<IsbnList> {
        if !path.is_file() {
            return Err(Error::NotFound(format!("File does not exist: {:?}", path)));
        }
        let options = self.search_options()?;
        IsbnSearch::new(self.toolbox(), &options)
            .search_file_for_isbns(path)
            .await
    }

    /// Finds ISBNs in a file or, when `input_data` is not a file, in the string itself.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use ebooktools::prelude::*;
    /// # async fn run() -> ebooktools::error::Result<()> {
    /// let config = EbookToolsConfig::builder().build()?;
    /// let isbns = config.find("ISBN 978-3-16-148410-0").await?;
    /// assert_eq!(isbns, "9783161484100");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find(&self, input_data: &str) -> Result<String> {
        let path = Path::new(input_data);
        if path.is_file() {
            log::debug!("{:?} is a file, running the search pipeline", path);
            let isbns = self.search_file_for_isbns(path).await?;
            Ok(isbns.join(&self.isbn_ret_separator))
        } else {
            log::debug!("Searching the input string for ISBNs");
            self.find_isbns(input_data)
        }
    }

    /// Converts `input` to a text file at `output`, using OCR when allowed.
    ///
    /// # Returns
    ///
    /// * `Ok(0)` - The text was written to `output`
    /// * `Ok(code)` - No text could be produced; see [`convert_file`]
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<i32> {
        if !input.is_file() {
            return Err(Error::NotFound(format!("File does not exist: {:?}", input)));
        }
        let toolbox = self.toolbox();
        let mime_type = detect_mime_type(&toolbox, input, self.mime_detection).await;
        convert_file(&toolbox, input, output, &mime_type, &self.ocr_options()).await
    }

    /// Runs OCR on `input`, writing the recognized text to `output`.
    pub async fn ocr_file(&self, input: &Path, output: &Path) -> Result<OcrStatus> {
        let toolbox = self.toolbox();
        let mime_type = detect_mime_type(&toolbox, input, self.mime_detection).await;
        ocr_file(&toolbox, input, output, &mime_type, &self.ocr_options()).await
    }
}

impl EbookToolsConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        let patterns = [
            ("isbn_blacklist_regex", &self.isbn_blacklist_regex),
            ("isbn_direct_grep_files", &self.isbn_direct_grep_files),
            ("isbn_ignored_files", &self.isbn_ignored_files),
        ];
        for (name, pattern) in patterns {
            if let Some(s) = pattern {
                if name == "isbn_blacklist_regex" && s.is_empty() {
                    continue;
                }
                if Regex::new(s).is_err() {
                    return Err(format!("Invalid {}: {}", name, s));
                }
            }
        }
        if let Some(s) = &self.isbn_regex {
            if let Err(e) = IsbnMatcher::new(s, None) {
                return Err(format!("Invalid isbn_regex: {}", e));
            }
        }

        if let Some(Some(order)) = &self.isbn_grep_reorder_files {
            if order.scan_first == 0 && order.reverse_last == 0 {
                return Err(
                    "isbn_grep_reorder_files needs at least one positive line count".to_string(),
                );
            }
        }
        if let Some(Some(pages)) = &self.ocr_only_first_last_pages {
            if pages.first == 0 && pages.last == 0 {
                return Err(
                    "ocr_only_first_last_pages needs at least one positive page count".to_string(),
                );
            }
        }
        if let Some(command) = &self.ocr_command {
            if command.trim().is_empty() {
                return Err("ocr_command must not be empty".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EbookToolsConfig::builder().build().unwrap();
        assert_eq!(config.ocr_enabled, OcrMode::Disabled);
        assert_eq!(config.ocr_command, "tesseract");
        assert_eq!(
            config.ocr_only_first_last_pages,
            Some(PageRestriction::new(7, 3))
        );
        assert_eq!(config.isbn_grep_reorder_files, Some(ReorderLines::new(400, 50)));
        assert_eq!(config.isbn_ret_separator, "\n");
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let result = EbookToolsConfig::builder()
            .isbn_ignored_files("^(image/")
            .build();
        assert!(matches!(
            result,
            Err(EbookToolsConfigBuilderError::ValidationError(msg)) if msg.contains("isbn_ignored_files")
        ));
    }

    #[test]
    fn test_zero_page_restriction_is_rejected() {
        let result = EbookToolsConfig::builder()
            .ocr_only_first_last_pages(PageRestriction::new(0, 0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_find_isbns_uses_separator() {
        let config = EbookToolsConfig::builder()
            .isbn_ret_separator(", ")
            .build()
            .unwrap();
        let found = config
            .find_isbns("0-306-40615-2 and 978-3-16-148410-0")
            .unwrap();
        assert_eq!(found, "0306406152, 9783161484100");
    }

    #[test]
    fn test_disabled_blacklist() {
        let config = EbookToolsConfig::builder()
            .isbn_blacklist_regex("")
            .build()
            .unwrap();
        assert_eq!(config.find_isbns("0123456789").unwrap(), "0123456789");
    }
}
