use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::database::models::{ArtworkUpdate, NewArtwork};
use crate::database::repo::CatalogStore;
use crate::error::{CatalogError, Result};
use crate::storage::blobs::BlobStore;

/// The artwork currently open in the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: i64,
    pub name: String,
}

/// What a save should do to the catalog, fully resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIntent {
    /// Insert a fresh row.
    New,
    /// No selection, but the name belongs to an existing row: replace it.
    Overwrite { id: i64 },
    /// Selected row saved under its own name.
    UpdateInPlace { id: i64 },
    /// Selected row saved under a new name, keeping its id.
    Rename { id: i64 },
    /// Selected row left alone; the image becomes a new row.
    SaveAsNew,
}

/// Operator's answer when the selected artwork is saved under a different name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameChoice {
    Rename,
    SaveAsNew,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecision {
    Resolved(SaveIntent),
    NeedsConfirmation {
        id: i64,
        current_name: String,
        candidate_name: String,
    },
}

impl SaveDecision {
    /// `None` means the operator cancelled.
    pub fn resolve(self, choice: RenameChoice) -> Option<SaveIntent> {
        match self {
            SaveDecision::Resolved(intent) => Some(intent),
            SaveDecision::NeedsConfirmation { id, .. } => match choice {
                RenameChoice::Rename => Some(SaveIntent::Rename { id }),
                RenameChoice::SaveAsNew => Some(SaveIntent::SaveAsNew),
                RenameChoice::Cancel => None,
            },
        }
    }
}

pub fn decide(store: &CatalogStore, selection: Option<&Selection>, name: &str) -> Result<SaveDecision> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }

    let decision = match selection {
        None => match store.find_by_name(name)? {
            Some(existing) => SaveDecision::Resolved(SaveIntent::Overwrite { id: existing.id }),
            None => SaveDecision::Resolved(SaveIntent::New),
        },
        Some(sel) if sel.name == name => SaveDecision::Resolved(SaveIntent::UpdateInPlace { id: sel.id }),
        Some(sel) => SaveDecision::NeedsConfirmation {
            id: sel.id,
            current_name: sel.name.clone(),
            candidate_name: name.to_string(),
        },
    };
    Ok(decision)
}

#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub image: Vec<u8>,
    pub name: String,
    pub artist: String,
    pub tags: BTreeSet<String>,
    pub intent: SaveIntent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtwork {
    pub id: i64,
    pub path: PathBuf,
}

/// Runs one save to completion: blob, thumbnail, row commit (tags are
/// upserted in the same transaction), then removal of the superseded blob.
///
/// A failure after the blob write leaves the new file orphaned; the catalog
/// itself is unchanged.
pub fn run_save(store: &mut CatalogStore, blobs: &BlobStore, request: &SaveRequest) -> Result<SavedArtwork> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }
    let tags = request.tags.clone();
    let artist = request.artist.trim();

    debug!(name, intent = ?request.intent, "save: writing blob");
    let path = blobs.write_full(&request.image, name)?;

    debug!(path = %path.display(), "save: writing thumbnail");
    if let Err(e) = blobs.write_thumbnail(&request.image, &path) {
        warn!(path = %path.display(), "Leaving orphaned blob after failed save");
        return Err(e);
    }

    debug!("save: committing row");
    let filepath = path.to_string_lossy().to_string();
    let committed = match request.intent {
        SaveIntent::New | SaveIntent::SaveAsNew => {
            let new = NewArtwork {
                name: name.to_string(),
                artist: artist.to_string(),
                tags,
                filepath: filepath.clone(),
            };
            store.create_artwork(&new).map(|id| (id, None))
        }
        SaveIntent::Overwrite { id } | SaveIntent::UpdateInPlace { id } | SaveIntent::Rename { id } => {
            let rename = matches!(request.intent, SaveIntent::Rename { .. });
            replace_row(store, id, rename.then_some(name), artist, tags, &filepath)
                .map(|old| (id, Some(old)))
        }
    };
    let (id, superseded) = match committed {
        Ok(done) => done,
        Err(e) => {
            warn!(path = %path.display(), "Leaving orphaned blob after failed commit");
            return Err(e);
        }
    };

    if let Some(old) = superseded {
        purge_blob(blobs, Path::new(&old));
    }

    info!(id, name, path = %path.display(), "Saved artwork");
    Ok(SavedArtwork { id, path })
}

/// Points an existing row at the new blob. Returns the old file path.
fn replace_row(
    store: &mut CatalogStore,
    id: i64,
    new_name: Option<&str>,
    artist: &str,
    tags: BTreeSet<String>,
    filepath: &str,
) -> Result<String> {
    let update = ArtworkUpdate {
        name: new_name.map(str::to_string),
        artist: Some(artist.to_string()),
        tags: Some(tags),
        filepath: Some(filepath.to_string()),
    };
    let previous = store.swap_artwork(id, &update)?;
    Ok(previous.filepath)
}

/// Best-effort removal of a superseded or deleted blob and its thumbnail.
pub(crate) fn purge_blob(blobs: &BlobStore, full: &Path) {
    if let Err(e) = blobs.delete_full(full) {
        warn!(path = %full.display(), "Could not remove blob: {}", e);
    }
    if let Err(e) = blobs.delete_thumbnail(full) {
        warn!(path = %full.display(), "Could not remove thumbnail: {}", e);
    }
}
