//! Keeps the per-artwork `tags` cache in step with the canonical `tags` table.
//!
//! Candidates are found with a plain substring match in SQL, which cannot tell
//! `art` from `cart`, so every candidate is split on the delimiter and edited
//! token by token before being written back.

use std::collections::BTreeSet;

use rusqlite::{params, Transaction};
use tracing::debug;

use crate::error::{CatalogError, Result};

pub const DELIMITER: char = ',';

pub fn split_tags(field: &str) -> Vec<&str> {
    field
        .split(DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Sorted, de-duplicated, comma-joined.
pub fn join_tags<I, S>(tags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<String> = tags
        .into_iter()
        .map(|t| t.as_ref().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    set.into_iter().collect::<Vec<_>>().join(",")
}

/// Trims and lower-cases a tag name. Returns `Ok(None)` for a blank name.
pub fn normalize_tag(raw: &str) -> Result<Option<String>> {
    let tag = raw.trim().to_lowercase();
    if tag.is_empty() {
        return Ok(None);
    }
    if tag.contains(DELIMITER) {
        return Err(CatalogError::InvalidTag(tag));
    }
    Ok(Some(tag))
}

pub fn normalize_tags<I, S>(raw: I) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeSet::new();
    for tag in raw {
        if let Some(tag) = normalize_tag(tag.as_ref())? {
            out.insert(tag);
        }
    }
    Ok(out)
}

pub fn rename_token(field: &str, old: &str, new: &str) -> String {
    join_tags(
        split_tags(field)
            .into_iter()
            .map(|t| if t == old { new } else { t }),
    )
}

pub fn remove_token(field: &str, token: &str) -> String {
    join_tags(split_tags(field).into_iter().filter(|t| *t != token))
}

/// Substitutes `old` with `new` in every artwork's tag cache. Returns the
/// number of rows rewritten.
pub(crate) fn propagate_rename(tx: &Transaction<'_>, old: &str, new: &str) -> Result<usize> {
    rewrite_matching(tx, old, |field| rename_token(field, old, new))
}

/// Drops `token` from every artwork's tag cache. Returns the number of rows
/// rewritten.
pub(crate) fn propagate_delete(tx: &Transaction<'_>, token: &str) -> Result<usize> {
    rewrite_matching(tx, token, |field| remove_token(field, token))
}

fn rewrite_matching<F>(tx: &Transaction<'_>, token: &str, edit: F) -> Result<usize>
where
    F: Fn(&str) -> String,
{
    let candidates: Vec<(i64, String)> = {
        let mut stmt = tx.prepare("SELECT id, tags FROM artworks WHERE instr(tags, ?1) > 0")?;
        let rows = stmt.query_map(params![token], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<std::result::Result<_, _>>()?
    };

    let mut update = tx.prepare("UPDATE artworks SET tags = ?1 WHERE id = ?2")?;
    let mut rewritten = 0;
    for (id, field) in candidates {
        let edited = edit(&field);
        if edited != field {
            update.execute(params![edited, id])?;
            rewritten += 1;
        }
    }

    debug!(token, rewritten, "Propagated tag change to artworks");
    Ok(rewritten)
}
