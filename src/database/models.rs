use std::collections::BTreeSet;

use serde::Serialize;

use crate::database::tag_sync;

/// One catalog row. `tags` is the denormalized, comma-joined cache of the
/// artwork's tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artwork {
    pub id: i64,
    pub name: String,
    pub filepath: String,
    pub artist: String,
    pub tags: String,
    pub timestamp: String,
}

impl Artwork {
    pub fn tag_list(&self) -> Vec<&str> {
        tag_sync::split_tags(&self.tags)
    }

    pub fn tag_set(&self) -> BTreeSet<String> {
        self.tag_list().into_iter().map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewArtwork {
    pub name: String,
    pub artist: String,
    pub tags: BTreeSet<String>,
    pub filepath: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ArtworkUpdate {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub filepath: Option<String>,
}
