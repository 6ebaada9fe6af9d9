//! Boolean substring search over catalog rows. No ranking: the match set is
//! returned in store order.

use crate::database::models::Artwork;
use crate::database::tag_sync;

/// Lower-cased, whitespace-separated search terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    terms: Vec<String>,
}

impl Query {
    pub fn parse(text: &str) -> Self {
        Self {
            terms: text.split_whitespace().map(str::to_lowercase).collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Every term must occur in the name, the artist, or one of the tags.
    pub fn matches(&self, artwork: &Artwork) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let name = artwork.name.to_lowercase();
        let artist = artwork.artist.to_lowercase();
        let tags: Vec<String> = tag_sync::split_tags(&artwork.tags)
            .into_iter()
            .map(str::to_lowercase)
            .collect();

        self.terms.iter().all(|term| {
            name.contains(term.as_str())
                || artist.contains(term.as_str())
                || tags.iter().any(|tag| tag.contains(term.as_str()))
        })
    }
}

pub fn search(artworks: Vec<Artwork>, text: &str) -> Vec<Artwork> {
    let query = Query::parse(text);
    if query.is_empty() {
        return artworks;
    }
    artworks.into_iter().filter(|a| query.matches(a)).collect()
}
