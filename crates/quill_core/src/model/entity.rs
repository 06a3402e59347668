//! Entity declarations consumed by the generic repository.
//!
//! An entity type states where it lives (`TABLE`), what it may read and write
//! (`COLUMNS`), how it links to other entities (`RELATIONS`) and which columns
//! request-driven search may touch (`SEARCHABLE`). The repository checks the
//! declaration against the live schema once, at construction.

use crate::query::Operator;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Primary key type shared by all blog tables.
pub type EntityId = i64;

/// Dynamic column/value mapping used for writes and raw rows.
pub type Attributes = Map<String, Value>;

/// How a related table is reached from the owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Owning row holds `foreign_key` pointing at `related.owner_key`.
    BelongsTo {
        related: &'static str,
        related_columns: &'static [&'static str],
        foreign_key: &'static str,
        owner_key: &'static str,
    },
    /// Related rows hold `foreign_key` pointing at owner `local_key`.
    HasMany {
        related: &'static str,
        related_columns: &'static [&'static str],
        foreign_key: &'static str,
        local_key: &'static str,
    },
    /// Rows are linked through a pivot table.
    BelongsToMany {
        related: &'static str,
        related_columns: &'static [&'static str],
        pivot: &'static str,
        foreign_pivot_key: &'static str,
        related_pivot_key: &'static str,
        local_key: &'static str,
        related_key: &'static str,
    },
}

impl Relation {
    pub fn related_table(&self) -> &'static str {
        match self {
            Self::BelongsTo { related, .. }
            | Self::HasMany { related, .. }
            | Self::BelongsToMany { related, .. } => *related,
        }
    }

    pub fn related_columns(&self) -> &'static [&'static str] {
        match self {
            Self::BelongsTo {
                related_columns, ..
            }
            | Self::HasMany {
                related_columns, ..
            }
            | Self::BelongsToMany {
                related_columns, ..
            } => *related_columns,
        }
    }

    /// Tables besides the owner that must exist for this relation to load.
    pub(crate) fn required_tables(&self) -> Vec<&'static str> {
        match self {
            Self::BelongsToMany { related, pivot, .. } => vec![*related, *pivot],
            other => vec![other.related_table()],
        }
    }
}

/// Named relation declared on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    pub name: &'static str,
    pub relation: Relation,
}

/// Declaration of an entity served by `Repository<M>`.
///
/// Entities are decoded from JSON objects built out of rows, so unselected
/// columns and unloaded relations must carry `#[serde(default)]`.
pub trait Model: DeserializeOwned {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str = "id";
    /// Every readable/writable column, primary key included.
    const COLUMNS: &'static [&'static str];
    const RELATIONS: &'static [RelationDef] = &[];
    /// Columns open to request search with their default operator.
    const SEARCHABLE: &'static [(&'static str, Operator)] = &[];
    /// Whether updates refresh `updated_at`.
    const TIMESTAMPS: bool = false;

    fn has_column(column: &str) -> bool {
        Self::COLUMNS.contains(&column)
    }

    fn relation(name: &str) -> Option<&'static RelationDef> {
        Self::RELATIONS.iter().find(|def| def.name == name)
    }

    fn searchable(column: &str) -> Option<Operator> {
        Self::SEARCHABLE
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, op)| *op)
    }
}
