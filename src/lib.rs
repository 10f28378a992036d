//! ebooktools - Ebook Collection Utilities
//!
//! This crate finds ISBNs inside ebook files, converts ebooks to text (with
//! optional OCR) and splits large flat folders of ebooks into numbered folders.
//!
//! The ISBN search tries progressively more expensive strategies on a file:
//! its name, its raw contents for text files, its calibre metadata, the
//! members of the archive it may be, its converted text and finally OCR. The
//! first strategy that yields a valid ISBN ends the search.
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use ebooktools::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> ebooktools::error::Result<()> {
//!     // 1. Configure the search using the builder
//!     let config = EbookToolsConfig::builder()
//!         .ocr_enabled(OcrMode::Enabled)
//!         .ocr_only_first_last_pages(PageRestriction::new(7, 3))
//!         .isbn_ret_separator(", ")
//!         .build()?;
//!
//!     // 2. Search a file (or a plain string) for ISBNs
//!     let isbns = config.find("./books/unknown_book.pdf").await?;
//!     println!("Found: {}", isbns);
//!
//!     // 3. Convert an ebook to text, using OCR if conversion yields nothing
//!     let status = config
//!         .convert(Path::new("./books/scan.djvu"), Path::new("./scan.txt"))
//!         .await?;
//!     println!("Conversion finished with status {}", status);
//!
//!     Ok(())
//! }
//! ```
//!
//! External programs (pdftotext, calibre, Ghostscript, tesseract, 7z, ...) are
//! started through the [`tools::ToolRunner`] trait; a custom runner can be set
//! with [`EbookToolsConfigBuilder::tool_runner`].

pub mod archive;
pub mod collector;
pub mod convert;
pub mod ebooktools;
pub mod error;
pub mod isbn;
pub mod ocr;
pub mod path_utils;
pub mod pipeline;
pub mod reorder;
pub mod settings;
pub mod split;
pub mod tools;
pub mod types;

// Publicly expose the main `EbookToolsConfig` struct and its builder
pub use ebooktools::EbookToolsConfig;
pub use ebooktools::EbookToolsConfigBuilder;

// Re-export core types and operations for direct access
pub use isbn::{IsbnList, IsbnMatcher, find_isbns, is_isbn_valid};
pub use split::{SplitOptions, split_into_folders};
pub use types::{
    MimeDetection, OcrMode, OcrStatus, PageRestriction, ReorderLines, ShellOutput, SplitReport,
};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use ebooktools::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        EbookToolsConfig, EbookToolsConfigBuilder, IsbnList, IsbnMatcher, MimeDetection, OcrMode,
        OcrStatus, PageRestriction, ReorderLines, ShellOutput, SplitOptions, SplitReport, error,
        find_isbns, is_isbn_valid, split_into_folders, types,
    };
    pub use crate::tools::{SystemRunner, ToolCommand, ToolPaths, ToolRunner};
    pub use std::path::{Path, PathBuf};
    pub use std::sync::Arc;
}
