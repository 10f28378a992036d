//! Archive extraction for the ISBN search.
//!
//! `7z` handles every archive format it knows when it is installed. Without it,
//! ZIP based containers (zip, epub, cbz, docx, odt, ...) are still unpacked in
//! process. Any failure here only means "this file is not an archive".

use std::path::Path;
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};
use crate::tools::Toolbox;

/// Extracts `archive` into the existing directory `destination`.
///
/// # Returns
///
/// * `Ok(())` - The archive was extracted
/// * `Err(Error)` - The file is not an archive or extraction failed
pub async fn extract_archive(toolbox: &Toolbox<'_>, archive: &Path, destination: &Path) -> Result<()> {
    let seven_zip = toolbox.paths().seven_zip.clone();
    if toolbox.has(&seven_zip) {
        let output = toolbox.seven_zip_extract(archive, destination).await?;
        log::debug!("Result of 7z on {:?}: {}", archive, output);
        if output.has_errors() {
            return Err(Error::ToolFailed {
                tool: seven_zip,
                message: if output.stderr.trim().is_empty() {
                    format!("exit code {:?}", output.return_code)
                } else {
                    output.stderr
                },
            });
        }
        return Ok(());
    }

    log::debug!(
        "{} is not available, trying in-process ZIP extraction of {:?}",
        seven_zip,
        archive
    );
    let archive = archive.to_path_buf();
    let destination = destination.to_path_buf();
    spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&archive)?;
        let mut zip = zip::ZipArchive::new(file)?;
        zip.extract(&destination)?;
        Ok(())
    })
    .await?
}
