//! Blog post entity.
//!
//! # Invariants
//! - `slug` is unique across posts.
//! - A post is publicly visible only when `published` is set and
//!   `published_at` is absent or not in the future.

use crate::model::entity::{EntityId, Model, Relation, RelationDef};
use crate::model::flag::bool_from_int;
use crate::model::tag::Tag;
use crate::model::user::User;
use crate::query::Operator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: EntityId,
    pub author_id: Option<EntityId>,
    pub title: String,
    pub slug: String,
    pub subtitle: Option<String>,
    /// Markdown body.
    pub content: String,
    #[serde(deserialize_with = "bool_from_int")]
    pub published: bool,
    /// Unix epoch milliseconds.
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Post {
    /// Returns whether readers may see this post at `now_ms`.
    pub fn is_visible_at(&self, now_ms: i64) -> bool {
        self.published && self.published_at.map_or(true, |at| at <= now_ms)
    }
}

impl Model for Post {
    const TABLE: &'static str = "posts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "author_id",
        "title",
        "slug",
        "subtitle",
        "content",
        "published",
        "published_at",
        "created_at",
        "updated_at",
    ];
    const RELATIONS: &'static [RelationDef] = &[
        RelationDef {
            name: "author",
            relation: Relation::BelongsTo {
                related: <User as Model>::TABLE,
                related_columns: <User as Model>::COLUMNS,
                foreign_key: "author_id",
                owner_key: "id",
            },
        },
        RelationDef {
            name: "tags",
            relation: Relation::BelongsToMany {
                related: <Tag as Model>::TABLE,
                related_columns: <Tag as Model>::COLUMNS,
                pivot: "post_tag",
                foreign_pivot_key: "post_id",
                related_pivot_key: "tag_id",
                local_key: "id",
                related_key: "id",
            },
        },
    ];
    const SEARCHABLE: &'static [(&'static str, Operator)] = &[
        ("title", Operator::Like),
        ("subtitle", Operator::Like),
        ("content", Operator::Like),
        ("slug", Operator::Eq),
        ("author_id", Operator::Eq),
    ];
    const TIMESTAMPS: bool = true;
}
