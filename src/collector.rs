//! Ebook file collection for the split utility.
//!
//! This module walks a folder tree and gathers the ebook files to distribute,
//! leaving out hidden entries and the metadata sidecars that travel with them.

use std::path::{Path, PathBuf};

use tokio::fs::{ReadDir, read_dir};

use crate::error::{Error, Result};
use crate::path_utils::is_hidden_file;

/// Collects the ebook files below a base directory.
#[derive(Debug)]
pub struct Collector<'a> {
    base_directory: &'a Path,
    metadata_extension: &'a str, // Sidecar files with this extension are not collected
    reverse: bool,
}

impl<'a> Collector<'a> {
    /// Creates a new Collector instance for the specified directory.
    ///
    /// # Arguments
    ///
    /// * `base_directory` - Folder to walk recursively
    /// * `metadata_extension` - Extension (without the dot) of metadata sidecar files
    /// * `reverse` - Sort the collected files in descending order
    pub fn new(base_directory: &'a Path, metadata_extension: &'a str, reverse: bool) -> Self {
        Self {
            base_directory,
            metadata_extension,
            reverse,
        }
    }

    /// Collects every regular file below the base directory, sorted by path.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<PathBuf>>` - Files to split, hidden and metadata files excluded
    pub async fn collect_files(&self) -> Result<Vec<PathBuf>> {
        if !self.base_directory.is_dir() {
            return Err(Error::InvalidPath(
                self.base_directory.to_path_buf(),
                "not a directory".to_string(),
            ));
        }

        let mut files = Vec::new();
        let mut pending = vec![self.base_directory.to_path_buf()];
        while let Some(directory) = pending.pop() {
            let (dirs, dir_files) = self.collect_entries(&directory).await?;
            pending.extend(dirs);
            files.extend(dir_files.into_iter().filter(|f| !self.is_metadata_file(f)));
        }

        files.sort();
        if self.reverse {
            files.reverse();
        }
        log::debug!("Collected {} files under {:?}", files.len(), self.base_directory);
        Ok(files)
    }

    /// Reads one directory, returning its visible sub-directories and files.
    pub async fn collect_entries(&self, directory: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        let mut entries: ReadDir = read_dir(directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            // Skip hidden files
            if is_hidden_file(&path) {
                log::debug!("Skipping hidden entry {:?}", path);
                continue;
            }

            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                dirs.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }

        Ok((dirs, files))
    }

    fn is_metadata_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy() == self.metadata_extension)
            .unwrap_or(false)
    }
}
