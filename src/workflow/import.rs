use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::database::models::NewArtwork;
use crate::database::repo::CatalogStore;
use crate::error::{CatalogError, Result};
use crate::ingest::scanner::scan_folder;
use crate::storage::blobs::BlobStore;
use crate::workflow::save::purge_blob;
use crate::workflow::Progress;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: Vec<i64>,
    /// Source file names skipped because their display name was taken or
    /// their stem is blank.
    pub duplicates: Vec<String>,
}

impl ImportReport {
    /// `None` when nothing was skipped.
    pub fn duplicates_summary(&self) -> Option<String> {
        if self.duplicates.is_empty() {
            return None;
        }
        Some(format!(
            "Skipped {} file(s) whose names are blank or already exist:\n{}",
            self.duplicates.len(),
            self.duplicates.join("\n")
        ))
    }
}

/// Imports every whitelisted image directly inside `folder`.
///
/// Imported artworks take the file stem as their name, with no artist and no
/// tags. Name collisions are collected in the report and do not stop the
/// batch; any other failure does.
pub fn run_import<F>(
    store: &mut CatalogStore,
    blobs: &BlobStore,
    folder: &Path,
    mut on_progress: F,
) -> Result<ImportReport>
where
    F: FnMut(Progress),
{
    let files = scan_folder(folder)?;
    let total = files.len();
    info!(folder = %folder.display(), total, "Importing folder");

    let mut report = ImportReport::default();
    for (index, source) in files.iter().enumerate() {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        on_progress(Progress {
            current: index + 1,
            total,
            item: file_name.clone(),
        });

        let name = source
            .file_stem()
            .map(|s| s.to_string_lossy().trim().to_string())
            .unwrap_or_default();
        if name.is_empty() {
            debug!(file = %file_name, "Skipping file with a blank name");
            report.duplicates.push(file_name);
            continue;
        }
        if store.find_by_name(&name)?.is_some() {
            debug!(file = %file_name, "Skipping duplicate name");
            report.duplicates.push(file_name);
            continue;
        }

        let bytes = fs::read(source).map_err(|e| CatalogError::io(source, e))?;
        let path = blobs.write_full(&bytes, &file_name)?;
        blobs.write_thumbnail(&bytes, &path)?;

        let new = NewArtwork {
            name,
            filepath: path.to_string_lossy().to_string(),
            ..Default::default()
        };
        match store.create_artwork(&new) {
            Ok(id) => report.imported.push(id),
            Err(CatalogError::DuplicateName(_)) => {
                // Another writer took the name after the check above.
                purge_blob(blobs, &path);
                report.duplicates.push(file_name);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        imported = report.imported.len(),
        duplicates = report.duplicates.len(),
        "Import finished"
    );
    Ok(report)
}
