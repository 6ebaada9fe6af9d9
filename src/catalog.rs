use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::database::models::Artwork;
use crate::database::repo::CatalogStore;
use crate::error::Result;
use crate::search;
use crate::storage::blobs::BlobStore;
use crate::utils::config::CatalogConfig;
use crate::workflow::save::purge_blob;
use crate::workflow::{
    decide, run_import, run_save, ImportReport, JobHandle, SaveDecision, SaveIntent, SaveRequest,
    SavedArtwork, Selection,
};

/// Entry point for the UI layer.
///
/// Holds one store connection for interactive calls. Saves and imports run on
/// worker threads, each with a connection of its own.
pub struct Catalog {
    config: CatalogConfig,
    store: CatalogStore,
    blobs: BlobStore,
}

impl Catalog {
    pub fn open(config: CatalogConfig) -> Result<Self> {
        let store = CatalogStore::open(&config.db_path)?;
        let blobs = BlobStore::new(&config.image_dir)?;
        info!(db = %config.db_path.display(), images = %blobs.root().display(), "Opened catalog");
        Ok(Self { config, store, blobs })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn thumbnail_path(&self, artwork: &Artwork) -> Result<PathBuf> {
        self.blobs.thumbnail_path(Path::new(&artwork.filepath))
    }

    /// Classifies a save before it runs. A `NeedsConfirmation` answer must be
    /// resolved by the operator before calling `save_artwork`.
    pub fn decide_save(&self, selection: Option<&Selection>, name: &str) -> Result<SaveDecision> {
        decide(&self.store, selection, name)
    }

    pub fn save_artwork(&self, request: SaveRequest) -> JobHandle<SavedArtwork> {
        let db_path = self.config.db_path.clone();
        let blobs = self.blobs.clone();
        JobHandle::spawn("save", move |_| {
            let mut store = CatalogStore::open(&db_path)?;
            run_save(&mut store, &blobs, &request)
        })
    }

    /// Swaps the image of an existing artwork, keeping its name, artist and tags.
    pub fn replace_image(&self, id: i64, image: Vec<u8>) -> Result<JobHandle<SavedArtwork>> {
        let current = self.store.get_artwork(id)?;
        let request = SaveRequest {
            image,
            tags: current.tag_set(),
            name: current.name,
            artist: current.artist,
            intent: SaveIntent::UpdateInPlace { id },
        };
        let db_path = self.config.db_path.clone();
        let blobs = self.blobs.clone();
        Ok(JobHandle::spawn("replace", move |_| {
            let mut store = CatalogStore::open(&db_path)?;
            run_save(&mut store, &blobs, &request)
        }))
    }

    pub fn import_folder(&self, folder: impl Into<PathBuf>) -> JobHandle<ImportReport> {
        let folder = folder.into();
        let db_path = self.config.db_path.clone();
        let blobs = self.blobs.clone();
        JobHandle::spawn("import", move |reporter| {
            let mut store = CatalogStore::open(&db_path)?;
            run_import(&mut store, &blobs, &folder, |p| reporter.progress(p))
        })
    }

    /// Removes the row first, then its blobs.
    pub fn delete_artwork(&mut self, id: i64) -> Result<()> {
        let filepath = self.store.delete_artwork(id)?;
        purge_blob(&self.blobs, Path::new(&filepath));
        info!(id, "Deleted artwork");
        Ok(())
    }

    pub fn get_artwork(&self, id: i64) -> Result<Artwork> {
        self.store.get_artwork(id)
    }

    pub fn list_artworks(&self) -> Result<Vec<Artwork>> {
        self.store.list_artworks()
    }

    pub fn search(&self, query: &str) -> Result<Vec<Artwork>> {
        Ok(search::search(self.store.list_artworks()?, query))
    }

    pub fn list_tags(&self) -> Result<BTreeSet<String>> {
        self.store.list_tags()
    }

    pub fn add_tag(&mut self, name: &str) -> Result<()> {
        self.store.upsert_tag(name)
    }

    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<()> {
        self.store.rename_tag(old, new)
    }

    pub fn delete_tag(&mut self, name: &str) -> Result<()> {
        self.store.delete_tag(name)
    }

    /// Irreversibly drops every row and every blob, leaving an empty catalog.
    pub fn wipe_all(&mut self) -> Result<()> {
        warn!(db = %self.config.db_path.display(), "Wiping the entire catalog");
        self.store.reset()?;
        self.blobs.wipe()?;
        Ok(())
    }
}
