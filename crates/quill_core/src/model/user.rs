//! Blog author account.

use crate::model::entity::{EntityId, Model, Relation, RelationDef};
use crate::model::post::Post;
use crate::query::Operator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Filled only when the `posts` relation is eager loaded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub posts: Vec<Post>,
}

impl Model for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["id", "name", "email", "created_at", "updated_at"];
    const RELATIONS: &'static [RelationDef] = &[RelationDef {
        name: "posts",
        relation: Relation::HasMany {
            related: <Post as Model>::TABLE,
            related_columns: <Post as Model>::COLUMNS,
            foreign_key: "author_id",
            local_key: "id",
        },
    }];
    const SEARCHABLE: &'static [(&'static str, Operator)] =
        &[("name", Operator::Like), ("email", Operator::Eq)];
    const TIMESTAMPS: bool = true;
}
