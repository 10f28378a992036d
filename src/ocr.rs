//! OCR orchestration.
//!
//! Paginated documents (PDF, DjVu) are rasterized one page at a time and each
//! page image is handed to the OCR backend. Plain images are recognized
//! directly as a single unit. Pages are processed strictly in ascending order
//! and their text is concatenated into the output file.

use std::path::Path;
use std::str::FromStr;
use tokio::fs;

use crate::error::{Error, Result};
use crate::path_utils::close_temp_path;
use crate::tools::Toolbox;
use crate::types::{DocumentKind, OcrMode, OcrStatus, PageRestriction, ShellOutput};

/// OCR options threaded from the configuration into conversions and searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    pub mode: OcrMode,
    /// Backend identifier, resolved with [`OcrBackend::from_name`].
    pub command: String,
    pub pages: Option<PageRestriction>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            mode: OcrMode::Disabled,
            command: "tesseract".to_string(),
            pages: Some(PageRestriction::new(7, 3)),
        }
    }
}

/// The OCR engines ebooktools knows how to drive.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OcrBackend {
    Tesseract,
}

impl OcrBackend {
    /// Resolves a configured backend identifier.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim() {
            "tesseract" | "tesseract_wrapper" => Ok(OcrBackend::Tesseract),
            other => Err(Error::UnknownOcrBackend(other.to_string())),
        }
    }

    /// Program the backend needs, looked up in the toolbox paths.
    pub fn program<'t>(&self, toolbox: &'t Toolbox<'_>) -> &'t str {
        match self {
            OcrBackend::Tesseract => &toolbox.paths().tesseract,
        }
    }

    /// Recognizes the text of `image` into `output`.
    pub async fn recognize(&self, toolbox: &Toolbox<'_>, image: &Path, output: &Path) -> Result<ShellOutput> {
        match self {
            OcrBackend::Tesseract => toolbox.tesseract(image, output).await,
        }
    }
}

impl FromStr for OcrBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Computes the 1-based pages to OCR out of `total`.
///
/// Without a restriction every page is returned. With one, the result is the
/// union of the first `first` and the last `last` pages, sorted, without
/// duplicates and clipped to the document.
pub fn pages_to_process(total: u32, restriction: Option<PageRestriction>) -> Vec<u32> {
    let Some(PageRestriction { first, last }) = restriction else {
        return (1..=total).collect();
    };

    let head_end = first.min(total);
    let tail_start = total.saturating_sub(last) + 1;

    let mut pages: Vec<u32> = (1..=head_end).chain(tail_start.max(1)..=total).collect();
    pages.sort_unstable();
    pages.dedup();
    pages
}

/// Runs OCR on `input`, writing the recognized text to `output`.
///
/// # Returns
///
/// * `Ok(OcrStatus::Success)` - `output` holds the recognized text
/// * `Ok(OcrStatus::BackendUnavailable)` - The backend is unknown, or a program
///   needed for this document (OCR engine, page counter, rasterizer) is not installed
/// * `Ok(OcrStatus::UnsupportedFormat)` - The MIME type is neither PDF, DjVu nor an image
/// * `Ok(OcrStatus::Failed)` - The pages could not be counted, or a plain image
///   could not be recognized
/// * `Err(Error)` - A temporary file could not be created or the output could not be written
pub async fn ocr_file(
    toolbox: &Toolbox<'_>,
    input: &Path,
    output: &Path,
    mime_type: &str,
    options: &OcrOptions,
) -> Result<OcrStatus> {
    let Some(kind) = DocumentKind::from_mime(mime_type) else {
        log::info!("Unsupported mime type {}!", mime_type);
        return Ok(OcrStatus::UnsupportedFormat);
    };

    let backend = match OcrBackend::from_name(&options.command) {
        Ok(backend) if toolbox.has(backend.program(toolbox)) => backend,
        Ok(backend) => {
            log::warn!(
                "OCR backend {:?} needs {} which is not installed",
                backend,
                backend.program(toolbox)
            );
            return Ok(OcrStatus::BackendUnavailable);
        }
        Err(e) => {
            log::warn!("{}. Ending OCR.", e);
            return Ok(OcrStatus::BackendUnavailable);
        }
    };

    if let Some(missing) = page_tools(toolbox, kind)
        .into_iter()
        .find(|tool| !toolbox.has(tool))
    {
        log::warn!("OCR of {:?} needs {} which is not installed", input, missing);
        return Ok(OcrStatus::BackendUnavailable);
    }

    let page_count = match kind {
        DocumentKind::Pdf => toolbox.pdf_page_count(input).await,
        DocumentKind::Djvu => toolbox.djvu_page_count(input).await,
        DocumentKind::Image => return recognize_image(toolbox, backend, input, output, mime_type).await,
    };
    let total = match page_count {
        Ok(total) => total,
        Err(e) => {
            log::warn!("Could not count the pages of {:?}: {}", input, e);
            return Ok(OcrStatus::Failed);
        }
    };

    log::info!(
        "Will run OCR on file {:?} with {} page{}",
        input,
        total,
        if total == 1 { "" } else { "s" }
    );
    let pages = pages_to_process(total, options.pages);
    log::debug!("Pages to process: {:?}", pages);

    let mut text = String::new();
    for page in pages {
        log::info!("Running OCR of page {} ...", page);
        match ocr_page(toolbox, backend, kind, page, input).await? {
            Some(page_text) => text.push_str(&page_text),
            None => log::warn!("Skipping page {} of {:?}", page, input),
        }
    }

    log::debug!("Saving the text content to {:?}", output);
    fs::write(output, text).await?;
    Ok(OcrStatus::Success)
}

/// Page counter and rasterizer a paginated document of `kind` needs.
fn page_tools<'t>(toolbox: &'t Toolbox<'_>, kind: DocumentKind) -> Vec<&'t str> {
    let paths = toolbox.paths();
    match kind {
        DocumentKind::Pdf => vec![paths.pdfinfo.as_str(), paths.ghostscript.as_str()],
        DocumentKind::Djvu => vec![paths.djvused.as_str(), paths.ddjvu.as_str()],
        DocumentKind::Image => Vec::new(),
    }
}

/// Recognizes a plain image as a single unit.
async fn recognize_image(
    toolbox: &Toolbox<'_>,
    backend: OcrBackend,
    input: &Path,
    output: &Path,
    mime_type: &str,
) -> Result<OcrStatus> {
    log::info!("Running OCR on file {:?} with mime type {}...", input, mime_type);
    match backend.recognize(toolbox, input, output).await {
        Ok(result) if result.success() => {
            log::debug!("Result of {:?}: {}", backend, result);
            Ok(OcrStatus::Success)
        }
        Ok(result) => {
            log::warn!("OCR of {:?} failed: {}", input, result.stderr.trim());
            Ok(OcrStatus::Failed)
        }
        Err(e) => {
            log::warn!("OCR of {:?} failed: {}", input, e);
            Ok(OcrStatus::Failed)
        }
    }
}

/// Rasterizes and recognizes one page; `None` when either step failed.
async fn ocr_page(
    toolbox: &Toolbox<'_>,
    backend: OcrBackend,
    kind: DocumentKind,
    page: u32,
    input: &Path,
) -> Result<Option<String>> {
    let image = toolbox.temp_file("ebooktools-page-", kind.page_image_suffix())?;
    let page_txt = match toolbox.temp_file("ebooktools-page-", ".txt") {
        Ok(path) => path,
        Err(e) => {
            close_temp_path(image);
            return Err(e);
        }
    };
    log::debug!("Using tmp files {:?} and {:?}", image, page_txt);

    let text = recognize_page(toolbox, backend, kind, page, input, &image, &page_txt).await;

    close_temp_path(image);
    close_temp_path(page_txt);
    Ok(text)
}

async fn recognize_page(
    toolbox: &Toolbox<'_>,
    backend: OcrBackend,
    kind: DocumentKind,
    page: u32,
    input: &Path,
    image: &Path,
    page_txt: &Path,
) -> Option<String> {
    let rasterized = match kind {
        DocumentKind::Pdf => toolbox.rasterize_pdf_page(page, input, image).await,
        DocumentKind::Djvu => toolbox.rasterize_djvu_page(page, input, image).await,
        DocumentKind::Image => return None,
    };
    match rasterized {
        Ok(result) if result.success() => log::debug!("Page {} rasterized: {}", page, result),
        Ok(result) => {
            log::warn!("Could not rasterize page {}: {}", page, result.stderr.trim());
            return None;
        }
        Err(e) => {
            log::warn!("Could not rasterize page {}: {}", page, e);
            return None;
        }
    }

    match backend.recognize(toolbox, image, page_txt).await {
        Ok(result) if result.success() => log::debug!("Result of {:?}: {}", backend, result),
        Ok(result) => {
            log::warn!("OCR of page {} failed: {}", page, result.stderr.trim());
            return None;
        }
        Err(e) => {
            log::warn!("OCR of page {} failed: {}", page, e);
            return None;
        }
    }

    match fs::read(page_txt).await {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            log::warn!("Could not read the OCR text of page {}: {}", page, e);
            None
        }
    }
}
