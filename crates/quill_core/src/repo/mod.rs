//! Repository layer: criteria-aware data access per entity.
//!
//! # Responsibility
//! - Provide the generic [`Repository`] every entity shares.
//! - Provide concrete repositories that register default criteria on boot.
//!
//! # Invariants
//! - Construction validates the entity against the live schema.
//! - Reads go through criteria; writes never do.
//! - Repository APIs return semantic errors (`NotFound`, configuration) in
//!   addition to DB transport errors.

pub mod error;
mod plain_repo;
pub mod post_repo;
pub mod repository;
mod schema;
mod slug;
pub mod tag_repo;

pub use error::{RepoError, RepoResult};
pub use plain_repo::{SettingRepository, UserRepository, WorkRepository};
pub use post_repo::PostRepository;
pub use repository::{Repository, Unscoped};
pub use tag_repo::TagRepository;
