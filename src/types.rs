//! Core data types and enums shared across ebooktools.
//!
//! This module defines the small value types the pipeline passes around:
//! - Option types read from configuration (`OcrMode`, `PageRestriction`, `ReorderLines`, `MimeDetection`)
//! - Results of external programs (`ShellOutput`) and of the OCR orchestrator (`OcrStatus`)
//! - Document classification (`DocumentKind`) and the extension based MIME table (`get_mime_type`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// MIME type reported when a file extension is not in the table.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Whether OCR may be used, and how eagerly.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum OcrMode {
    /// Never run OCR.
    #[default]
    #[serde(rename = "false")]
    Disabled,
    /// Run OCR when text conversion fails or yields no text.
    #[serde(rename = "true")]
    Enabled,
    /// Like `Enabled`, and also when converted text contains no ISBN.
    #[serde(rename = "always")]
    Always,
}

impl OcrMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, OcrMode::Disabled)
    }
}

impl FromStr for OcrMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "false" => Ok(OcrMode::Disabled),
            "true" => Ok(OcrMode::Enabled),
            "always" => Ok(OcrMode::Always),
            other => Err(Error::Unsupported(format!(
                "OCR mode '{}' (expected false, true or always)",
                other
            ))),
        }
    }
}

impl fmt::Display for OcrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OcrMode::Disabled => "false",
            OcrMode::Enabled => "true",
            OcrMode::Always => "always",
        };
        f.write_str(s)
    }
}

/// Restricts OCR to the first `first` and the last `last` pages of a document.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct PageRestriction {
    pub first: u32,
    pub last: u32,
}

impl PageRestriction {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }
}

/// Line counts used to reorder text before searching it for ISBNs.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct ReorderLines {
    /// Lines read verbatim from the start of the text.
    pub scan_first: usize,
    /// Lines taken from the end of the text and read in reverse order.
    pub reverse_last: usize,
}

impl ReorderLines {
    pub fn new(scan_first: usize, reverse_last: usize) -> Self {
        Self {
            scan_first,
            reverse_last,
        }
    }
}

impl Default for ReorderLines {
    fn default() -> Self {
        Self::new(400, 50)
    }
}

/// How the MIME type of a file is determined.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MimeDetection {
    /// Look the file extension up in the built-in table.
    #[default]
    Extension,
    /// Ask `file --brief --mime-type`, falling back to the extension table.
    FileCommand,
}

/// Outcome of the OCR orchestrator. `code` gives the numeric status reported to callers.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OcrStatus {
    Success,
    /// The configured backend is unknown, or it or the page tools of the document are not installed.
    BackendUnavailable,
    /// The document's MIME type cannot be OCR-ed.
    UnsupportedFormat,
    /// The document could not be read: its pages could not be counted, or the
    /// backend rejected a plain image.
    Failed,
}

impl OcrStatus {
    pub fn code(&self) -> i32 {
        match self {
            OcrStatus::Success => 0,
            OcrStatus::BackendUnavailable => 1,
            OcrStatus::UnsupportedFormat => 2,
            OcrStatus::Failed => 3,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == OcrStatus::Success
    }
}

/// Kind of document as far as OCR is concerned.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DocumentKind {
    Pdf,
    Djvu,
    /// A single raster image; it has no pages.
    Image,
}

impl DocumentKind {
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        if mime_type.starts_with("application/pdf") {
            Some(DocumentKind::Pdf)
        } else if mime_type.starts_with("image/vnd.djvu") {
            Some(DocumentKind::Djvu)
        } else if mime_type.starts_with("image/") {
            Some(DocumentKind::Image)
        } else {
            None
        }
    }

    /// Suffix of the temporary image a page of this kind is rasterized to.
    pub fn page_image_suffix(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => ".png",
            DocumentKind::Djvu => ".tif",
            DocumentKind::Image => "",
        }
    }
}

/// Captured result of one external program invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub return_code: Option<i32>,
    pub args: Vec<String>,
}

impl ShellOutput {
    /// True when the program exited with status zero.
    pub fn success(&self) -> bool {
        self.return_code == Some(0)
    }

    /// True when the program exited abnormally or wrote anything to stderr.
    pub fn has_errors(&self) -> bool {
        !self.success() || !self.stderr.trim().is_empty()
    }

    /// First whitespace separated token of stdout, if any.
    pub fn stdout_first_token(&self) -> Option<&str> {
        self.stdout.split_whitespace().next()
    }

    /// Parses the whole of stdout as an unsigned integer.
    pub fn parse_stdout_u32(&self) -> Result<u32> {
        let trimmed = self.stdout.trim();
        trimmed.parse::<u32>().map_err(|_| Error::InvalidToolOutput {
            tool: self.program().to_string(),
            output: trimmed.to_string(),
        })
    }

    /// Name of the program that produced this output.
    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for ShellOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stdout={}, stderr={}, returncode={:?}, args={:?}",
            self.stdout, self.stderr, self.return_code, self.args
        )
    }
}

/// Summary of a split-into-folders run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub total_files: usize,
    /// The numbered folders, in creation order.
    pub folders_created: Vec<PathBuf>,
}

/// Guesses the MIME type of a file from its extension.
///
/// The table mirrors the common platform MIME database entries for the formats
/// found in ebook collections. Unknown or missing extensions map to
/// [`UNKNOWN_MIME_TYPE`].
pub fn get_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        // Text
        Some("txt") | Some("text") => "text/plain",
        Some("htm") | Some("html") | Some("xhtml") => "text/html",
        Some("xml") => "text/xml",
        Some("csv") => "text/csv",
        Some("md") => "text/markdown",
        Some("rtf") => "application/rtf",
        // Documents and ebooks
        Some("pdf") => "application/pdf",
        Some("djvu") | Some("djv") => "image/vnd.djvu",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("odt") => "application/vnd.oasis.opendocument.text",
        Some("epub") => "application/epub+zip",
        Some("mobi") | Some("prc") => "application/x-mobipocket-ebook",
        Some("azw") | Some("azw3") => "application/vnd.amazon.ebook",
        Some("fb2") => "application/x-fictionbook+xml",
        Some("lit") => "application/x-ms-reader",
        Some("pdb") => "application/vnd.palm",
        Some("chm") => "application/vnd.ms-htmlhelp",
        Some("ps") => "application/postscript",
        Some("xls") => "application/vnd.ms-excel",
        // Archives
        Some("zip") => "application/zip",
        Some("cbz") => "application/vnd.comicbook+zip",
        Some("rar") => "application/vnd.rar",
        Some("cbr") => "application/vnd.comicbook-rar",
        Some("7z") => "application/x-7z-compressed",
        Some("tar") => "application/x-tar",
        Some("gz") | Some("tgz") => "application/gzip",
        Some("bz2") => "application/x-bzip2",
        Some("xz") => "application/x-xz",
        Some("iso") => "application/x-iso9660-image",
        // Images
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        // Audio, video and other binaries
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/x-wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("mp4") => "video/mp4",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("swf") => "application/x-shockwave-flash",
        Some("ttf") => "application/x-font-ttf",
        Some("otf") => "application/vnd.ms-opentype",
        Some("exe") | Some("dll") => "application/x-dosexec",
        Some("jar") => "application/java-archive",
        Some("json") => "application/json",
        _ => UNKNOWN_MIME_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mime_type() {
        assert_eq!(get_mime_type(Path::new("book.PDF")), "application/pdf");
        assert_eq!(get_mime_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(get_mime_type(Path::new("scan.djvu")), "image/vnd.djvu");
        assert_eq!(get_mime_type(Path::new("no_extension")), UNKNOWN_MIME_TYPE);
    }

    #[test]
    fn test_document_kind_from_mime() {
        assert_eq!(
            DocumentKind::from_mime("application/pdf"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(
            DocumentKind::from_mime("image/vnd.djvu"),
            Some(DocumentKind::Djvu)
        );
        assert_eq!(DocumentKind::from_mime("image/png"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_mime("application/epub+zip"), None);
    }

    #[test]
    fn test_ocr_mode_parsing() {
        assert_eq!("always".parse::<OcrMode>().unwrap(), OcrMode::Always);
        assert_eq!("TRUE".parse::<OcrMode>().unwrap(), OcrMode::Enabled);
        assert!(!"false".parse::<OcrMode>().unwrap().is_enabled());
        assert!("sometimes".parse::<OcrMode>().is_err());
    }

    #[test]
    fn test_shell_output_accessors() {
        let output = ShellOutput {
            stdout: " 42\n".to_string(),
            return_code: Some(0),
            args: vec!["djvused".to_string()],
            ..Default::default()
        };
        assert!(output.success());
        assert!(!output.has_errors());
        assert_eq!(output.parse_stdout_u32().unwrap(), 42);

        let noisy = ShellOutput {
            stdout: "n/a".to_string(),
            stderr: "warning".to_string(),
            return_code: Some(0),
            args: vec!["pdfinfo".to_string()],
        };
        assert!(noisy.has_errors());
        assert!(matches!(
            noisy.parse_stdout_u32(),
            Err(Error::InvalidToolOutput { .. })
        ));
    }
}
