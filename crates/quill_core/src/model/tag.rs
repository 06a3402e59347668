//! Post tag entity.

use crate::model::entity::{EntityId, Model, Relation, RelationDef};
use crate::model::post::Post;
use crate::query::Operator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub posts: Vec<Post>,
}

impl Model for Tag {
    const TABLE: &'static str = "tags";
    const COLUMNS: &'static [&'static str] = &["id", "name", "slug", "created_at", "updated_at"];
    const RELATIONS: &'static [RelationDef] = &[RelationDef {
        name: "posts",
        relation: Relation::BelongsToMany {
            related: <Post as Model>::TABLE,
            related_columns: <Post as Model>::COLUMNS,
            pivot: "post_tag",
            foreign_pivot_key: "tag_id",
            related_pivot_key: "post_id",
            local_key: "id",
            related_key: "id",
        },
    }];
    const SEARCHABLE: &'static [(&'static str, Operator)] =
        &[("name", Operator::Like), ("slug", Operator::Eq)];
    const TIMESTAMPS: bool = true;
}
