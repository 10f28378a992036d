//! The ISBN search pipeline.
//!
//! A file goes through progressively more expensive stages until one of them
//! yields at least one valid ISBN:
//!
//! 1. the file name
//! 2. the contents of plain text files (which ends the search either way), or
//!    an immediate stop for ignored formats
//! 3. the metadata reported by `ebook-meta`
//! 4. the members of the file when it is an archive, searched recursively
//! 5. the text of the file after conversion
//! 6. the text recognized by OCR
//!
//! Every expected failure of a stage (missing tool, non-archive, failed
//! conversion) is logged and the pipeline moves on to the next stage.

use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use std::path::Path;
use tokio::fs;

use crate::archive::extract_archive;
use crate::convert::{convert_to_txt, read_text_if_any};
use crate::error::Result;
use crate::isbn::{IsbnList, IsbnMatcher};
use crate::ocr::{OcrOptions, ocr_file};
use crate::path_utils::{close_temp_dir, close_temp_path, get_file_name_lossy, remove_dir_if_empty, remove_file_logged};
use crate::reorder::{reorder_content, reorder_file_content};
use crate::tools::Toolbox;
use crate::types::{MimeDetection, OcrMode, ReorderLines, get_mime_type};

/// Compiled settings of one ISBN search, built from the configuration.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub matcher: IsbnMatcher,
    /// MIME types whose raw contents are searched directly.
    pub direct_grep_files: Regex,
    /// MIME types that never carry an ISBN.
    pub ignored_files: Regex,
    pub reorder: Option<ReorderLines>,
    pub ocr: OcrOptions,
    pub mime_detection: MimeDetection,
}

/// Runs the search pipeline with a fixed toolbox and set of options.
#[derive(Debug, Clone, Copy)]
pub struct IsbnSearch<'a> {
    toolbox: Toolbox<'a>,
    options: &'a SearchOptions,
}

impl<'a> IsbnSearch<'a> {
    pub fn new(toolbox: Toolbox<'a>, options: &'a SearchOptions) -> Self {
        Self { toolbox, options }
    }

    /// Searches one file for ISBNs.
    ///
    /// Returns the ISBNs of the first stage that found any, or of all archive
    /// members combined. An empty list means nothing was found.
    ///
    /// # Errors
    ///
    /// Only unexpected filesystem failures, such as being unable to create a
    /// temporary file, are returned as errors.
    pub fn search_file_for_isbns<'s>(&'s self, path: &'s Path) -> BoxFuture<'s, Result<IsbnList>> {
        async move {
            log::info!("Searching file {:?} for ISBN numbers...", path);

            let isbns = self.options.matcher.find_isbns(&get_file_name_lossy(path));
            if !isbns.is_empty() {
                log::info!("Extracted ISBNs {} from the file name!", isbns);
                return Ok(isbns);
            }

            let mime_type = self.mime_type(path).await;
            if self.options.direct_grep_files.is_match(&mime_type) {
                log::info!("Ebook is in text format, trying to find ISBN directly");
                let data = reorder_file_content(path, self.options.reorder).await?;
                let isbns = self.options.matcher.find_isbns(&data);
                if isbns.is_empty() {
                    log::info!("Did not find any ISBNs");
                } else {
                    log::info!("Extracted ISBNs {} from the text file contents!", isbns);
                }
                return Ok(isbns);
            }
            if self.options.ignored_files.is_match(&mime_type) {
                log::info!("The file type {} is ignored", mime_type);
                return Ok(IsbnList::new());
            }

            let isbns = self.search_metadata(path).await;
            if !isbns.is_empty() {
                log::info!("Extracted ISBNs {} from calibre ebook metadata!", isbns);
                return Ok(isbns);
            }

            let isbns = self.search_archive(path).await?;
            if !isbns.is_empty() {
                log::info!("Extracted ISBNs {} from the archive file", isbns);
                return Ok(isbns);
            }

            let isbns = self.search_converted(path, &mime_type).await?;
            if isbns.is_empty() {
                log::info!("Could not find any ISBNs in {:?} :(", path);
            } else {
                log::info!("Returning the found ISBNs {}!", isbns);
            }
            Ok(isbns)
        }
        .boxed()
    }

    async fn mime_type(&self, path: &Path) -> String {
        detect_mime_type(&self.toolbox, path, self.options.mime_detection).await
    }

    async fn search_metadata(&self, path: &Path) -> IsbnList {
        let ebook_meta = &self.toolbox.paths().ebook_meta;
        if !self.toolbox.has(ebook_meta) {
            log::debug!("{} is not installed, skipping the metadata check", ebook_meta);
            return IsbnList::new();
        }

        match self.toolbox.ebook_metadata(path).await {
            Ok(result) => {
                log::info!("Ebook metadata:\n{}", result.stdout);
                self.options.matcher.find_isbns(&result.stdout)
            }
            Err(e) => {
                log::warn!("Could not read the metadata of {:?}: {}", path, e);
                IsbnList::new()
            }
        }
    }

    /// Extracts `path` into a temporary folder and searches every member.
    async fn search_archive(&self, path: &Path) -> Result<IsbnList> {
        let tmp_dir = self.toolbox.temp_dir("ebooktools-archive-")?;
        log::info!("Trying to decompress {:?} into {:?}", path, tmp_dir.path());

        if let Err(e) = extract_archive(&self.toolbox, path, tmp_dir.path()).await {
            log::info!("Not an archive: {}", e);
            close_temp_dir(tmp_dir);
            return Ok(IsbnList::new());
        }

        log::info!("Archive extracted successfully, scanning its contents...");
        let mut isbns = IsbnList::new();
        let walked = self.search_extracted(tmp_dir.path(), &mut isbns).await;
        close_temp_dir(tmp_dir);
        if let Err(e) = walked {
            log::warn!("Could not scan every member of {:?}: {}", path, e);
        }
        Ok(isbns)
    }

    /// Walks `dir` bottom-up, searching and then deleting every regular file.
    fn search_extracted<'s>(&'s self, dir: &'s Path, isbns: &'s mut IsbnList) -> BoxFuture<'s, Result<()>> {
        async move {
            let mut entries = fs::read_dir(dir).await?;
            let mut dirs = Vec::new();
            let mut files = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    dirs.push(entry.path());
                } else if file_type.is_file() {
                    files.push(entry.path());
                }
            }
            dirs.sort();
            files.sort();

            for sub_dir in &dirs {
                self.search_extracted(sub_dir, isbns).await?;
                remove_dir_if_empty(sub_dir).await;
            }

            for file in &files {
                log::debug!("Checking archive member {:?}", file);
                match self.search_file_for_isbns(file).await {
                    Ok(found) => isbns.extend_unique(found),
                    Err(e) => log::warn!("Could not search archive member {:?}: {}", file, e),
                }
                remove_file_logged(file).await;
            }
            Ok(())
        }
        .boxed()
    }

    /// Converts `path` to text, falling back to OCR, and searches the result.
    async fn search_converted(&self, path: &Path, mime_type: &str) -> Result<IsbnList> {
        let tmp_txt = self.toolbox.temp_file("ebooktools-", ".txt")?;
        log::info!("Converting ebook to text format in file {:?}...", tmp_txt);

        let mut isbns = IsbnList::new();
        let mut try_ocr = false;

        match convert_to_txt(&self.toolbox, path, &tmp_txt, mime_type).await {
            Ok(Some(result)) if result.success() => {
                log::info!("Conversion to text was successful, checking the result...");
                match read_text_if_any(&tmp_txt).await {
                    Ok(Some(text)) => {
                        isbns = self
                            .options
                            .matcher
                            .find_isbns(&reorder_content(&text, self.options.reorder));
                        if !isbns.is_empty() {
                            log::info!("Text output contains ISBNs {}!", isbns);
                        } else if self.options.ocr.mode == OcrMode::Always {
                            log::info!(
                                "We will try OCR because the successfully converted text did not have any ISBNs"
                            );
                            try_ocr = true;
                        } else {
                            log::info!("Did not find any ISBNs and will NOT try OCR");
                        }
                    }
                    Ok(None) => try_ocr = true,
                    Err(e) => {
                        log::warn!("Could not read the converted text: {}", e);
                        try_ocr = true;
                    }
                }
            }
            Ok(Some(result)) => {
                log::info!("There was an error converting the book to txt format");
                log::debug!("{}", result);
                try_ocr = true;
            }
            Ok(None) => {
                log::info!("No text conversion applies to {}, marking for OCR", mime_type);
                try_ocr = true;
            }
            Err(e) => {
                log::info!("There was an error converting the book to txt format: {}", e);
                try_ocr = true;
            }
        }

        if isbns.is_empty() && try_ocr && self.options.ocr.mode.is_enabled() {
            log::info!("Trying to run OCR on the file...");
            match ocr_file(&self.toolbox, path, &tmp_txt, mime_type, &self.options.ocr).await {
                Ok(status) if status.is_success() => {
                    log::info!("OCR was successful, checking the result...");
                    match reorder_file_content(&tmp_txt, self.options.reorder).await {
                        Ok(data) => {
                            isbns = self.options.matcher.find_isbns(&data);
                            if isbns.is_empty() {
                                log::info!("Did not find any ISBNs in the OCR output");
                            } else {
                                log::info!("Text output contains ISBNs {}!", isbns);
                            }
                        }
                        Err(e) => log::warn!("Could not read the OCR output: {}", e),
                    }
                }
                Ok(status) => log::info!("OCR did not succeed (status {})", status.code()),
                Err(e) => log::info!("There was an error while running OCR: {}", e),
            }
        }

        close_temp_path(tmp_txt);
        Ok(isbns)
    }
}

/// Determines the MIME type of `path` with the configured detection method.
///
/// `file` is only asked when requested and installed; any failure falls back
/// to the extension table.
pub async fn detect_mime_type(toolbox: &Toolbox<'_>, path: &Path, detection: MimeDetection) -> String {
    let fallback = get_mime_type(path);
    if detection == MimeDetection::Extension {
        return fallback.to_string();
    }

    let file = &toolbox.paths().file;
    if !toolbox.has(file) {
        log::debug!("{} is not installed, guessing the MIME type from the extension", file);
        return fallback.to_string();
    }
    match toolbox.file_mime_type(path).await {
        Ok(mime_type) => mime_type,
        Err(e) => {
            log::warn!("Could not detect the MIME type of {:?}: {}", path, e);
            fallback.to_string()
        }
    }
}
