//! Unique slug allocation for sluggable tables.

use crate::model::entity::Model;
use crate::model::slug::slugify;
use crate::query::Query;
use crate::repo::error::RepoResult;
use rusqlite::Connection;

const FALLBACK_SLUG: &str = "untitled";

/// Derives a slug from `text` that no row of `M` uses yet.
///
/// Collisions get `-2`, `-3`, ... appended. Criteria never apply here.
pub(crate) fn unique_slug<M: Model>(conn: &Connection, text: &str) -> RepoResult<String> {
    let mut base = slugify(text);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let mut candidate = base.clone();
    let mut suffix = 2u32;
    while Query::<M>::new()
        .where_eq("slug", candidate.as_str())
        .count(conn)?
        > 0
    {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    Ok(candidate)
}
