//! Portfolio work entry.

use crate::model::entity::{EntityId, Model};
use crate::query::Operator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Work {
    pub id: EntityId,
    pub title: String,
    pub client: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Model for Work {
    const TABLE: &'static str = "works";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "client",
        "url",
        "description",
        "created_at",
        "updated_at",
    ];
    const SEARCHABLE: &'static [(&'static str, Operator)] =
        &[("title", Operator::Like), ("client", Operator::Like)];
    const TIMESTAMPS: bool = true;
}
