use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Find ISBNs in ebooks, convert ebooks to text and split ebook folders.
#[derive(Debug, Parser)]
#[command(name = "ebooktools", about, version)]
pub struct Cli {
    /// Configuration file. Default: <config dir>/ebooktools/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable quiet mode, i.e. nothing will be logged
    #[arg(short, long)]
    pub quiet: bool,

    /// Log debugging information
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not actually move any file
    #[arg(short, long)]
    pub dry_run: bool,

    /// Sort files in descending order
    #[arg(short, long)]
    pub reverse: bool,

    /// Logging level
    #[arg(long, value_enum)]
    pub loglvl: Option<LogLevel>,

    /// Logging format
    #[arg(long, value_enum)]
    pub logfmt: Option<LogFormat>,

    /// Regular expression matching ISBN-like numbers
    #[arg(short = 'i', long = "isbn-regex", value_name = "REGEX")]
    pub isbn_regex: Option<String>,

    /// Whether to use OCR for .pdf, .djvu and image files
    #[arg(long = "ocr", visible_alias = "ocr-enabled", value_enum)]
    pub ocr: Option<OcrArg>,

    /// Only OCR the first N and the last M pages
    #[arg(
        long = "ocrop",
        visible_alias = "ocr-only-first-last-pages",
        num_args = 2,
        value_names = ["N", "M"]
    )]
    pub ocrop: Option<Vec<u32>>,

    /// Extension of the metadata files saved next to ebooks
    #[arg(long = "ome", visible_alias = "output-metadata-extension", value_name = "EXTENSION")]
    pub output_metadata_extension: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find ISBNs in a file, or in a string when no such file exists
    Find {
        /// Path to a file, or a string to search
        input_data: String,
    },

    /// Convert a file to text, optionally with OCR
    Convert {
        /// The file to convert
        #[arg(value_name = "FILE")]
        input_file: PathBuf,

        /// The text file to write. Default: output.txt
        #[arg(short, long = "output-file", value_name = "OUTPUT")]
        output_file: Option<PathBuf>,
    },

    /// Split ebooks (and their metadata files) into numbered folders
    Split {
        /// Folder scanned recursively for ebooks
        #[arg(value_name = "FOLDER")]
        folder_with_books: PathBuf,

        /// Folder the numbered folders are created in. Default: current directory
        #[arg(short, long, value_name = "PATH")]
        output_folder: Option<PathBuf>,

        /// Number of the first folder
        #[arg(short, long)]
        start_number: Option<u64>,

        /// printf-style folder name pattern, e.g. %05d000
        #[arg(short, long, value_name = "PATTERN")]
        folder_pattern: Option<String>,

        /// How many files to move into each folder
        #[arg(long = "fpf", visible_alias = "files-per-folder", value_parser = clap::value_parser!(u64).range(1..))]
        files_per_folder: Option<u64>,
    },

    /// Edit or reset the configuration file
    Edit {
        /// The configuration to edit
        #[arg(value_enum)]
        cfg_type: ConfigKind,

        /// Application used to open the file. Default: $EDITOR or the platform opener
        #[arg(short, long, value_name = "NAME", conflicts_with = "reset")]
        app: Option<String>,

        /// Reset the file to the built-in defaults
        #[arg(short, long)]
        reset: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Console,
    Simple,
    #[value(name = "only_msg")]
    OnlyMsg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OcrArg {
    Always,
    True,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKind {
    Main,
    Log,
}
