use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::database::models::{Artwork, ArtworkUpdate, NewArtwork};
use crate::database::schema::{DROP_ALL, SCHEMA};
use crate::database::tag_sync;
use crate::error::{CatalogError, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ARTWORK_COLUMNS: &str = "id, name, filepath, artist, tags, timestamp";

/// One connection to the catalog database. Every worker thread opens its own.
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn write_tx(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    /// Tags are normalized before they reach the cache or the tag table.
    pub fn create_artwork(&mut self, new: &NewArtwork) -> Result<i64> {
        let tag_set = tag_sync::normalize_tags(&new.tags)?;
        let tags = tag_sync::join_tags(&tag_set);
        let tx = self.write_tx()?;
        tx.execute(
            "INSERT INTO artworks (name, filepath, artist, tags) VALUES (?1, ?2, ?3, ?4)",
            params![new.name, new.filepath, new.artist, tags],
        )
        .map_err(|e| map_unique(e, &new.name, &new.filepath))?;
        let id = tx.last_insert_rowid();
        insert_tags(&tx, &tag_set)?;
        tx.commit()?;

        debug!(id, name = %new.name, "Inserted artwork");
        Ok(id)
    }

    pub fn update_artwork(&mut self, id: i64, update: &ArtworkUpdate) -> Result<()> {
        self.swap_artwork(id, update).map(|_| ())
    }

    /// Like `update_artwork`, but returns the row as it was before the update.
    pub fn swap_artwork(&mut self, id: i64, update: &ArtworkUpdate) -> Result<Artwork> {
        let tag_set = update.tags.as_ref().map(|set| tag_sync::normalize_tags(set)).transpose()?;
        let tx = self.write_tx()?;
        let current = fetch_artwork(&tx, id)?.ok_or_else(|| CatalogError::artwork_not_found(id))?;

        let name = update.name.as_deref().unwrap_or(&current.name);
        let filepath = update.filepath.as_deref().unwrap_or(&current.filepath);
        let artist = update.artist.as_deref().unwrap_or(&current.artist);
        let tags = match &tag_set {
            Some(set) => tag_sync::join_tags(set),
            None => current.tags.clone(),
        };

        tx.execute(
            "UPDATE artworks
             SET name = ?1, filepath = ?2, artist = ?3, tags = ?4, timestamp = CURRENT_TIMESTAMP
             WHERE id = ?5",
            params![name, filepath, artist, tags, id],
        )
        .map_err(|e| map_unique(e, name, filepath))?;
        if let Some(set) = &tag_set {
            insert_tags(&tx, set)?;
        }
        tx.commit()?;

        debug!(id, "Updated artwork");
        Ok(current)
    }

    /// Removes the row and hands back its file path so the caller can purge the blob.
    pub fn delete_artwork(&mut self, id: i64) -> Result<String> {
        let tx = self.write_tx()?;
        let filepath: String = tx
            .query_row("SELECT filepath FROM artworks WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?
            .ok_or_else(|| CatalogError::artwork_not_found(id))?;
        tx.execute("DELETE FROM artworks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(filepath)
    }

    pub fn get_artwork(&self, id: i64) -> Result<Artwork> {
        fetch_artwork(&self.conn, id)?.ok_or_else(|| CatalogError::artwork_not_found(id))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Artwork>> {
        let sql = format!("SELECT {} FROM artworks WHERE name = ?1", ARTWORK_COLUMNS);
        Ok(self.conn.query_row(&sql, params![name], artwork_from_row).optional()?)
    }

    pub fn list_artworks(&self) -> Result<Vec<Artwork>> {
        let sql = format!("SELECT {} FROM artworks ORDER BY id", ARTWORK_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], artwork_from_row)?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Idempotent: an existing tag is left alone.
    pub fn upsert_tag(&mut self, name: &str) -> Result<()> {
        let Some(tag) = tag_sync::normalize_tag(name)? else {
            return Ok(());
        };
        self.conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![tag])?;
        Ok(())
    }

    pub fn list_tags(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM tags")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Renames the canonical tag and rewrites every artwork cache in the same
    /// transaction.
    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<()> {
        let old = tag_sync::normalize_tag(old)?.ok_or_else(|| CatalogError::tag_not_found(old))?;
        let new = tag_sync::normalize_tag(new)?
            .ok_or_else(|| CatalogError::InvalidTag(new.to_string()))?;
        if old == new {
            return Ok(());
        }

        let tx = self.write_tx()?;
        if tag_exists(&tx, &new)? {
            return Err(CatalogError::DuplicateTag(new));
        }
        let changed = tx.execute("UPDATE tags SET name = ?1 WHERE name = ?2", params![new, old])?;
        if changed == 0 {
            return Err(CatalogError::tag_not_found(&old));
        }
        let rewritten = tag_sync::propagate_rename(&tx, &old, &new)?;
        tx.commit()?;

        info!(%old, %new, rewritten, "Renamed tag");
        Ok(())
    }

    /// Deletes the canonical tag and strips it from every artwork cache in the
    /// same transaction. Deleting an unknown tag still cleans stale caches.
    pub fn delete_tag(&mut self, name: &str) -> Result<()> {
        let Some(tag) = tag_sync::normalize_tag(name)? else {
            return Ok(());
        };

        let tx = self.write_tx()?;
        tx.execute("DELETE FROM tags WHERE name = ?1", params![tag])?;
        let rewritten = tag_sync::propagate_delete(&tx, &tag)?;
        tx.commit()?;

        info!(%tag, rewritten, "Deleted tag");
        Ok(())
    }

    /// Drops every row of both tables and recreates an empty schema.
    pub fn reset(&mut self) -> Result<()> {
        let tx = self.write_tx()?;
        tx.execute_batch(DROP_ALL)?;
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;
        Ok(())
    }
}

fn insert_tags(tx: &Transaction<'_>, tags: &BTreeSet<String>) -> Result<()> {
    let mut stmt = tx.prepare("INSERT OR IGNORE INTO tags (name) VALUES (?1)")?;
    for tag in tags {
        stmt.execute(params![tag])?;
    }
    Ok(())
}

fn tag_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM tags WHERE name = ?1", params![name], |_| Ok(()))
        .optional()?
        .is_some())
}

fn fetch_artwork(conn: &Connection, id: i64) -> Result<Option<Artwork>> {
    let sql = format!("SELECT {} FROM artworks WHERE id = ?1", ARTWORK_COLUMNS);
    Ok(conn.query_row(&sql, params![id], artwork_from_row).optional()?)
}

fn artwork_from_row(row: &Row<'_>) -> rusqlite::Result<Artwork> {
    Ok(Artwork {
        id: row.get(0)?,
        name: row.get(1)?,
        filepath: row.get(2)?,
        artist: row.get(3)?,
        tags: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

fn map_unique(err: rusqlite::Error, name: &str, filepath: &str) -> CatalogError {
    if let rusqlite::Error::SqliteFailure(failure, Some(msg)) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            if msg.contains("artworks.name") {
                return CatalogError::DuplicateName(name.to_string());
            }
            if msg.contains("artworks.filepath") {
                return CatalogError::DuplicatePath(filepath.to_string());
            }
        }
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artwork(name: &str, path: &str, tags: &[&str]) -> NewArtwork {
        NewArtwork {
            name: name.to_string(),
            artist: "ana".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            filepath: path.to_string(),
        }
    }

    #[test]
    fn test_create_and_fetch_round_trip() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        let id = store.create_artwork(&artwork("sunset", "/img/a.png", &["warm", "nature"]))?;

        let fetched = store.get_artwork(id)?;
        assert_eq!(fetched.name, "sunset");
        assert_eq!(fetched.artist, "ana");
        assert_eq!(fetched.tags, "nature,warm");
        assert!(!fetched.timestamp.is_empty());
        assert_eq!(store.list_tags()?, fetched.tag_set());
        Ok(())
    }

    #[test]
    fn test_uniqueness_violations_are_typed() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        store.create_artwork(&artwork("sunset", "/img/a.png", &[]))?;

        let err = store.create_artwork(&artwork("sunset", "/img/b.png", &[])).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName(ref n) if n == "sunset"));

        let err = store.create_artwork(&artwork("dawn", "/img/a.png", &[])).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicatePath(_)));

        assert_eq!(store.list_artworks()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_update_missing_and_colliding() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        store.create_artwork(&artwork("sunset", "/img/a.png", &[]))?;
        let dawn = store.create_artwork(&artwork("dawn", "/img/b.png", &[]))?;

        let err = store.update_artwork(99, &ArtworkUpdate::default()).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));

        let rename = ArtworkUpdate {
            name: Some("sunset".to_string()),
            ..Default::default()
        };
        let err = store.update_artwork(dawn, &rename).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName(_)));
        assert_eq!(store.get_artwork(dawn)?.name, "dawn");

        let retag = ArtworkUpdate {
            artist: Some("bo".to_string()),
            tags: Some(["cold".to_string()].into_iter().collect()),
            ..Default::default()
        };
        store.update_artwork(dawn, &retag)?;
        let updated = store.get_artwork(dawn)?;
        assert_eq!(updated.artist, "bo");
        assert_eq!(updated.tags, "cold");
        assert!(store.list_tags()?.contains("cold"));
        Ok(())
    }

    #[test]
    fn test_delete_returns_path() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        let id = store.create_artwork(&artwork("sunset", "/img/a.png", &[]))?;

        assert_eq!(store.delete_artwork(id)?, "/img/a.png");
        assert!(matches!(store.delete_artwork(id), Err(CatalogError::NotFound(_))));
        assert!(store.list_artworks()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_upsert_tag_is_idempotent() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        store.upsert_tag("Warm")?;
        store.upsert_tag("warm")?;
        store.upsert_tag("  ")?;

        assert_eq!(store.list_tags()?.into_iter().collect::<Vec<_>>(), vec!["warm"]);
        Ok(())
    }

    #[test]
    fn test_rename_tag_propagates() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        let a = store.create_artwork(&artwork("a", "/img/a.png", &["art", "warm"]))?;
        let b = store.create_artwork(&artwork("b", "/img/b.png", &["cart"]))?;

        store.rename_tag("art", "painting")?;

        assert_eq!(store.get_artwork(a)?.tags, "painting,warm");
        assert_eq!(store.get_artwork(b)?.tags, "cart");
        let tags = store.list_tags()?;
        assert!(tags.contains("painting"));
        assert!(!tags.contains("art"));
        Ok(())
    }

    #[test]
    fn test_rename_tag_collision_leaves_everything_alone() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        let a = store.create_artwork(&artwork("a", "/img/a.png", &["art", "warm"]))?;

        let err = store.rename_tag("art", "warm").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateTag(ref t) if t == "warm"));
        assert_eq!(store.get_artwork(a)?.tags, "art,warm");

        assert!(matches!(store.rename_tag("ghost", "spirit"), Err(CatalogError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_delete_tag_scenario() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        let a = store.create_artwork(&artwork("a", "/img/a.png", &["warm", "nature"]))?;
        let b = store.create_artwork(&artwork("b", "/img/b.png", &["warm"]))?;
        let c = store.create_artwork(&artwork("c", "/img/c.png", &["lukewarm"]))?;

        store.delete_tag("warm")?;

        assert_eq!(store.get_artwork(a)?.tags, "nature");
        assert_eq!(store.get_artwork(b)?.tags, "");
        assert_eq!(store.get_artwork(c)?.tags, "lukewarm");
        assert!(!store.list_tags()?.contains("warm"));
        Ok(())
    }

    #[test]
    fn test_tags_are_normalized_on_every_write() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        let id = store.create_artwork(&artwork("a", "/img/a.png", &["Warm", " Nature ", ""]))?;

        assert_eq!(store.get_artwork(id)?.tags, "nature,warm");
        assert_eq!(store.list_tags()?.into_iter().collect::<Vec<_>>(), vec!["nature", "warm"]);

        let retag = ArtworkUpdate {
            tags: Some(["COLD".to_string()].into_iter().collect()),
            ..Default::default()
        };
        store.update_artwork(id, &retag)?;
        assert_eq!(store.get_artwork(id)?.tags, "cold");

        store.delete_tag("Warm")?;
        store.delete_tag("cold")?;
        assert_eq!(store.get_artwork(id)?.tags, "");
        assert_eq!(store.list_tags()?.into_iter().collect::<Vec<_>>(), vec!["nature"]);
        Ok(())
    }

    #[test]
    fn test_delimiter_in_tag_is_rejected_by_store() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;

        let err = store.create_artwork(&artwork("a", "/img/a.png", &["a,b"])).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTag(_)));
        assert!(store.list_artworks()?.is_empty());
        assert!(store.list_tags()?.is_empty());

        let id = store.create_artwork(&artwork("a", "/img/a.png", &["warm"]))?;
        let bad = ArtworkUpdate {
            tags: Some(["x,y".to_string()].into_iter().collect()),
            ..Default::default()
        };
        assert!(matches!(store.update_artwork(id, &bad), Err(CatalogError::InvalidTag(_))));
        assert_eq!(store.get_artwork(id)?.tags, "warm");
        Ok(())
    }

    #[test]
    fn test_reset_empties_catalog() -> Result<()> {
        let mut store = CatalogStore::open_in_memory()?;
        store.create_artwork(&artwork("a", "/img/a.png", &["warm"]))?;

        store.reset()?;

        assert!(store.list_artworks()?.is_empty());
        assert!(store.list_tags()?.is_empty());
        store.create_artwork(&artwork("a", "/img/a.png", &[]))?;
        Ok(())
    }
}
