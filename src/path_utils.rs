//! Path utilities and logged filesystem cleanup.
//!
//! Cleanup failures never abort an ISBN search: a file that cannot be removed
//! is reported through the log and the caller carries on with whatever it has
//! already found. These helpers encode that policy in one place.

use std::path::Path;
use tempfile::{TempDir, TempPath};
use tokio::fs;

use crate::error::Result;

/// Final component of `path`, the string ISBNs are first searched in.
///
/// Non-UTF-8 names are converted lossily; a path without a file name yields `"unknown"`.
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Checks if a filename starts with a dot (hidden file).
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Checks whether a directory has no entries.
pub async fn is_dir_empty(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).await?;
    Ok(entries.next_entry().await?.is_none())
}

/// Removes a file, logging instead of failing.
///
/// # Returns
///
/// * `bool` - True if the file was removed
pub async fn remove_file_logged(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not remove file {:?}: {}", path, e);
            false
        }
    }
}

/// Removes a directory if it is empty, logging instead of failing.
pub async fn remove_dir_if_empty(path: &Path) -> bool {
    match is_dir_empty(path).await {
        Ok(true) => match fs::remove_dir(path).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not remove directory {:?}: {}", path, e);
                false
            }
        },
        Ok(false) => false,
        Err(e) => {
            log::warn!("Could not inspect directory {:?}: {}", path, e);
            false
        }
    }
}

/// Deletes a temporary file now, logging a failure.
pub fn close_temp_path(path: TempPath) {
    let display = path.to_path_buf();
    log::debug!("Removing temporary file {:?}", display);
    if let Err(e) = path.close() {
        log::warn!("Could not remove temporary file {:?}: {}", display, e);
    }
}

/// Deletes a temporary directory tree now, logging a failure.
pub fn close_temp_dir(dir: TempDir) {
    let display = dir.path().to_path_buf();
    log::debug!("Removing temporary folder {:?}", display);
    if let Err(e) = dir.close() {
        log::warn!("Could not remove temporary folder {:?}: {}", display, e);
    }
}
