use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::ingest::hasher::short_digest;
use crate::media::mimetype::{detect_image_kind, ImageKind};
use crate::media::thumbnail::encode_thumbnail;

pub const THUMBS_DIR: &str = "thumbs";

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Full-size images and their thumbnails on disk, keyed only by path.
///
/// Directories are created lazily on the first write.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            let cwd = std::env::current_dir().map_err(|e| CatalogError::io(&root, e))?;
            cwd.join(root)
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a full-size image under a fresh name and returns its absolute path.
    ///
    /// The format is sniffed from `bytes`; `suggested_name` only supplies a
    /// fallback extension.
    pub fn write_full(&self, bytes: &[u8], suggested_name: &str) -> Result<PathBuf> {
        ensure_dir(&self.root)?;
        let kind = detect_image_kind(bytes)
            .or_else(|| ImageKind::from_path(Path::new(suggested_name)))
            .unwrap_or(ImageKind::Png);
        let stem = format!(
            "art_{}_{}",
            Utc::now().format("%Y%m%d%H%M%S%3f"),
            short_digest(bytes)
        );

        let (path, mut file) = self.claim(&stem, kind.extension())?;
        if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
            drop(file);
            if let Err(rm) = fs::remove_file(&path) {
                warn!(path = %path.display(), "Could not remove partial blob: {}", rm);
            }
            return Err(CatalogError::io(path, e));
        }

        debug!(path = %path.display(), bytes = bytes.len(), "Wrote full-size blob");
        Ok(path)
    }

    /// Creates the file exclusively so concurrent writers never share a name.
    fn claim(&self, stem: &str, ext: &str) -> Result<(PathBuf, File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{}.{}", stem, ext)
            } else {
                format!("{}-{}.{}", stem, attempt, ext)
            };
            let path = self.root.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(CatalogError::io(path, e)),
            }
        }
        Err(CatalogError::Other(format!(
            "No free blob name for {} after {} attempts",
            stem, MAX_NAME_ATTEMPTS
        )))
    }

    /// The thumbnail shares the full file's name inside a sibling `thumbs` dir.
    pub fn thumbnail_path(&self, full: &Path) -> Result<PathBuf> {
        let name = full
            .file_name()
            .ok_or_else(|| CatalogError::Other(format!("Blob path has no file name: {:?}", full)))?;
        let parent = full.parent().unwrap_or(&self.root);
        Ok(parent.join(THUMBS_DIR).join(name))
    }

    pub fn write_thumbnail(&self, bytes: &[u8], full: &Path) -> Result<PathBuf> {
        let thumb_path = self.thumbnail_path(full)?;
        if let Some(dir) = thumb_path.parent() {
            ensure_dir(dir)?;
        }
        let format = ImageKind::from_path(full)
            .unwrap_or(ImageKind::Png)
            .image_format();
        let encoded = encode_thumbnail(bytes, format)?;

        let mut file = File::create(&thumb_path).map_err(|e| CatalogError::io(&thumb_path, e))?;
        file.write_all(&encoded)
            .and_then(|_| file.sync_all())
            .map_err(|e| CatalogError::io(&thumb_path, e))?;

        debug!(path = %thumb_path.display(), "Wrote thumbnail");
        Ok(thumb_path)
    }

    pub fn delete_full(&self, path: &Path) -> Result<()> {
        remove_if_present(path)
    }

    /// Takes the full-size path and removes the matching thumbnail.
    pub fn delete_thumbnail(&self, full: &Path) -> Result<()> {
        remove_if_present(&self.thumbnail_path(full)?)
    }

    /// Removes the entire blob root. A missing root counts as success.
    pub fn wipe(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::io(&self.root, e)),
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CatalogError::io(path, e)),
    }
}
