//! Conversion of ebooks to plain text.
//!
//! [`convert_to_txt`] picks one text extraction backend from the MIME type and
//! the installed tools. [`convert_file`] is the standalone conversion used by
//! the `convert` command: it adds the OCR fallback on top of the dispatcher.

use std::path::Path;
use tokio::fs;

use crate::error::{Error, Result};
use crate::ocr::{OcrOptions, ocr_file};
use crate::tools::Toolbox;
use crate::types::{OcrMode, ShellOutput};

/// Converts `input` to text in `output` with the most specific available backend.
///
/// Backends are tried in this order, first match wins:
/// 1. PDF with `pdftotext` installed
/// 2. Word document with `catdoc` installed
/// 3. DjVu with `djvutxt` installed
/// 4. Any other image: no backend applies
/// 5. Everything else: calibre's `ebook-convert`
///
/// # Returns
///
/// * `Ok(Some(ShellOutput))` - A backend ran; its return code tells whether it succeeded
/// * `Ok(None)` - The file is a plain image and nothing was run
/// * `Err(Error)` - The fallback converter is not installed or could not be run
pub async fn convert_to_txt(
    toolbox: &Toolbox<'_>,
    input: &Path,
    output: &Path,
    mime_type: &str,
) -> Result<Option<ShellOutput>> {
    let paths = toolbox.paths();
    let is_djvu = mime_type.starts_with("image/vnd.djvu");

    let result = if mime_type == "application/pdf" && toolbox.has(&paths.pdftotext) {
        log::info!("The file looks like a pdf, using pdftotext to extract the text");
        toolbox.pdftotext(input, output).await?
    } else if mime_type == "application/msword" && toolbox.has(&paths.catdoc) {
        log::info!("The file looks like a doc, using catdoc to extract the text");
        toolbox.catdoc(input, output).await?
    } else if is_djvu && toolbox.has(&paths.djvutxt) {
        log::info!("The file looks like a djvu, using djvutxt to extract the text");
        toolbox.djvutxt(input, output).await?
    } else if !is_djvu && mime_type.starts_with("image/") {
        log::info!(
            "The file looks like a normal image ({}), skipping ebook-convert usage!",
            mime_type
        );
        return Ok(None);
    } else {
        if !toolbox.has(&paths.ebook_convert) {
            return Err(Error::ToolUnavailable(paths.ebook_convert.clone()));
        }
        log::info!(
            "Trying to use calibre's ebook-convert to convert the {} file to .txt",
            mime_type
        );
        toolbox.ebook_convert(input, output).await?
    };

    log::debug!("Conversion result: {}", result);
    Ok(Some(result))
}

/// Reads a converted text file, returning `None` when it has no alphanumeric character.
pub async fn read_text_if_any(path: &Path) -> Result<Option<String>> {
    let bytes = fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    if text.chars().any(char::is_alphanumeric) {
        Ok(Some(text))
    } else {
        log::info!(
            "The converted txt with size {} bytes does not seem to contain text",
            bytes.len()
        );
        Ok(None)
    }
}

/// Converts `input` to text at `output`, falling back to OCR when allowed.
///
/// With [`OcrMode::Always`] OCR runs even after a successful conversion and
/// its status decides the outcome.
///
/// # Returns
///
/// * `Ok(0)` - `output` holds text from conversion or OCR
/// * `Ok(code)` - Conversion produced no text; `code` is the OCR status, or 1 when OCR is
///   disabled or could not run
///
/// Missing tools and unreadable documents are reported through the status, never as `Err`.
pub async fn convert_file(
    toolbox: &Toolbox<'_>,
    input: &Path,
    output: &Path,
    mime_type: &str,
    ocr: &OcrOptions,
) -> Result<i32> {
    log::info!("Converting {:?} ({}) to {:?}", input, mime_type, output);

    let has_text = match convert_to_txt(toolbox, input, output, mime_type).await {
        Ok(Some(result)) if result.success() => match read_text_if_any(output).await {
            Ok(text) => text.is_some(),
            Err(e) => {
                log::warn!("Could not read the converted text: {}", e);
                false
            }
        },
        Ok(Some(result)) => {
            log::info!("There was an error converting the file to txt format");
            log::debug!("{}", result.stderr);
            false
        }
        Ok(None) => false,
        Err(e) => {
            log::info!("Could not convert the file to txt format: {}", e);
            false
        }
    };

    if has_text && ocr.mode != OcrMode::Always {
        log::info!("Conversion to text was successful");
        return Ok(0);
    }
    if !ocr.mode.is_enabled() {
        log::info!("Conversion did not produce any text and OCR is disabled");
        return Ok(1);
    }

    log::info!("Trying to run OCR on the file...");
    match ocr_file(toolbox, input, output, mime_type, ocr).await {
        Ok(status) => {
            log::info!("OCR finished with status {}", status.code());
            Ok(status.code())
        }
        Err(e) => {
            log::warn!("There was an error while running OCR: {}", e);
            Ok(1)
        }
    }
}
