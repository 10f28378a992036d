//! Split a flat collection of ebooks into numbered folders.
//!
//! Files are distributed in sorted order into folders of `files_per_folder`
//! entries each. Every numbered folder gets a `<name>.<meta ext>` sibling that
//! receives the metadata sidecars of the files moved into it.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::path_utils::get_file_name_lossy;
use crate::types::SplitReport;

/// Options of [`split_into_folders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Folder the numbered folders are created in.
    pub output_folder: PathBuf,
    /// Number rendered into the first folder name.
    pub start_number: u64,
    /// printf-style folder name with a single `%d` directive, e.g. `%05d000`.
    pub folder_pattern: String,
    pub files_per_folder: usize,
    /// Extension (without the dot) of metadata sidecar files.
    pub output_metadata_extension: String,
    /// Only log what would be done.
    pub dry_run: bool,
    /// Distribute files in descending path order.
    pub reverse: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            output_folder: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            start_number: 0,
            folder_pattern: "%05d000".to_string(),
            files_per_folder: 1000,
            output_metadata_extension: "meta".to_string(),
            dry_run: false,
            reverse: false,
        }
    }
}

/// A parsed printf-style folder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPattern {
    prefix: String,
    width: usize,
    zero_pad: bool,
    suffix: String,
}

impl FolderPattern {
    /// Parses a pattern holding exactly one `%[0][width]d` directive.
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = || {
            Error::Unsupported(format!(
                "folder pattern '{}' (expected one %d directive, e.g. %05d000)",
                pattern
            ))
        };

        let start = pattern.find('%').ok_or_else(invalid)?;
        let rest = &pattern[start + 1..];
        let end = rest.find('d').ok_or_else(invalid)?;
        let directive = &rest[..end];
        if !directive.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let suffix = &rest[end + 1..];
        if suffix.contains('%') {
            return Err(invalid());
        }

        Ok(Self {
            prefix: pattern[..start].to_string(),
            width: if directive.is_empty() {
                0
            } else {
                directive.parse().map_err(|_| invalid())?
            },
            zero_pad: directive.starts_with('0'),
            suffix: suffix.to_string(),
        })
    }

    /// Renders the folder name for `number`.
    pub fn render(&self, number: u64) -> String {
        let digits = if self.zero_pad {
            format!("{:0width$}", number, width = self.width)
        } else {
            format!("{:>width$}", number, width = self.width)
        };
        format!("{}{}{}", self.prefix, digits, self.suffix)
    }
}

/// Moves the files below `folder` into numbered folders.
///
/// # Returns
///
/// * `Ok(SplitReport)` - Number of files and the numbered folders, in creation order
/// * `Err(Error)` - Invalid options, or a filesystem operation failed
pub async fn split_into_folders(folder: &Path, options: &SplitOptions) -> Result<SplitReport> {
    if options.files_per_folder == 0 {
        return Err(Error::Unsupported("files per folder must be positive".to_string()));
    }
    let pattern = FolderPattern::parse(&options.folder_pattern)?;

    let files = Collector::new(folder, &options.output_metadata_extension, options.reverse)
        .collect_files()
        .await?;
    let total_files = files.len();
    log::info!("Total number of files to be split into folders: {}", total_files);
    log::info!("Number of files per folder: {}", options.files_per_folder);
    log::info!(
        "Number of splits: {}",
        total_files.div_ceil(options.files_per_folder)
    );

    let mut report = SplitReport {
        total_files,
        folders_created: Vec::new(),
    };

    for (number, chunk) in (options.start_number..).zip(files.chunks(options.files_per_folder)) {
        let name = pattern.render(number);
        let current_folder = options.output_folder.join(&name);
        let metadata_folder = options
            .output_folder
            .join(format!("{}.{}", name, options.output_metadata_extension));

        log::debug!(
            "Creating folders {:?} and {:?} for {} files",
            current_folder,
            metadata_folder,
            chunk.len()
        );
        if !options.dry_run {
            fs::create_dir_all(&current_folder).await?;
            fs::create_dir_all(&metadata_folder).await?;
        }

        for file in chunk {
            let file_name = get_file_name_lossy(file);
            move_file(file, &current_folder.join(&file_name), options.dry_run).await?;

            let sidecar_name = format!("{}.{}", file_name, options.output_metadata_extension);
            let sidecar = file.with_file_name(&sidecar_name);
            if sidecar.is_file() {
                move_file(&sidecar, &metadata_folder.join(&sidecar_name), options.dry_run).await?;
            }
        }

        report.folders_created.push(current_folder);
    }

    log::info!("End of splits!");
    Ok(report)
}

async fn move_file(from: &Path, to: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        log::info!("(dry run) Would move {:?} to {:?}", from, to);
        return Ok(());
    }
    log::debug!("Moving {:?} to {:?}", from, to);
    if to.exists() {
        return Err(Error::InvalidPath(to.to_path_buf(), "already exists".to_string()));
    }

    if let Err(e) = fs::rename(from, to).await {
        // rename does not cross filesystems
        log::debug!("Rename failed ({}), copying instead", e);
        fs::copy(from, to).await?;
        fs::remove_file(from).await?;
    }
    Ok(())
}
