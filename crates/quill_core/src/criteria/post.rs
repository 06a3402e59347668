//! Post-specific criteria used by the blog pages and admin screens.

use crate::criteria::Criterion;
use crate::model::entity::EntityId;
use crate::model::post::Post;
use crate::query::{Comparison, Direction, Operator, Query};
use crate::repo::repository::Repository;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Eager loads each post's author.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithAuthor;

impl Criterion<Post> for WithAuthor {
    fn apply(&self, query: Query<Post>, _repository: &Repository<'_, Post>) -> Query<Post> {
        query.with("author")
    }

    fn name(&self) -> &'static str {
        "with_author"
    }
}

/// Eager loads each post's tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithTags;

impl Criterion<Post> for WithTags {
    fn apply(&self, query: Query<Post>, _repository: &Repository<'_, Post>) -> Query<Post> {
        query.with("tags")
    }

    fn name(&self) -> &'static str {
        "with_tags"
    }
}

/// Keeps posts written by one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByAuthor(pub EntityId);

impl Criterion<Post> for ByAuthor {
    fn apply(&self, query: Query<Post>, _repository: &Repository<'_, Post>) -> Query<Post> {
        query.where_eq("author_id", self.0)
    }

    fn name(&self) -> &'static str {
        "by_author"
    }
}

/// Keeps posts carrying the tag with `slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithTag(pub String);

impl Criterion<Post> for WithTag {
    fn apply(&self, query: Query<Post>, _repository: &Repository<'_, Post>) -> Query<Post> {
        query.where_has("tags", "slug", Operator::Eq, self.0.clone())
    }

    fn name(&self) -> &'static str {
        "with_tag"
    }
}

/// Keeps posts readers may see at a fixed instant (epoch milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    now_ms: i64,
}

impl Published {
    pub fn at(now_ms: i64) -> Self {
        Self { now_ms }
    }

    pub fn now() -> Self {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
        Self::at(now_ms)
    }
}

impl Criterion<Post> for Published {
    fn apply(&self, query: Query<Post>, _repository: &Repository<'_, Post>) -> Query<Post> {
        query.where_eq("published", true).where_any(vec![
            Comparison::new("published_at", Operator::Eq, Value::Null),
            Comparison::new("published_at", Operator::Lte, self.now_ms),
        ])
    }

    fn name(&self) -> &'static str {
        "published"
    }
}

/// Newest first: `published_at DESC`, ties broken by `id DESC`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestFirst;

impl Criterion<Post> for LatestFirst {
    fn apply(&self, query: Query<Post>, _repository: &Repository<'_, Post>) -> Query<Post> {
        query
            .order_by("published_at", Direction::Desc)
            .order_by("id", Direction::Desc)
    }

    fn name(&self) -> &'static str {
        "latest_first"
    }
}
