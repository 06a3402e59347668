//! Blog entities and the declaration trait the repository is generic over.
//!
//! # Responsibility
//! - Describe each table once: columns, relations, searchable fields.
//! - Decode rows (and eager-loaded relations) into typed structs via serde.
//!
//! # Invariants
//! - Every field that a projection or a missing relation can omit carries a
//!   serde default.

pub mod entity;
mod flag;
pub mod post;
pub mod setting;
pub mod slug;
pub mod tag;
pub mod user;
pub mod work;

pub use entity::{Attributes, EntityId, Model, Relation, RelationDef};
