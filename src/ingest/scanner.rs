use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CatalogError, Result};
use crate::media::mimetype::ImageKind;

/// Lists the importable images directly inside `root`, sorted by file name.
///
/// Subdirectories, symlinks and files outside the extension whitelist are
/// skipped without comment.
pub fn scan_folder(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    let mut accepted = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            CatalogError::io(path, source)
        })?;
        if entry.file_type().is_file() && ImageKind::from_path(entry.path()).is_some() {
            accepted.push(entry.into_path());
        }
    }
    Ok(accepted)
}
