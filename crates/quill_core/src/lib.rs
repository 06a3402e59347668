//! Core data access for the Quill blog engine.
//! Entities, criteria-aware repositories and the page-level services built on
//! them live here; every frontend goes through this crate.

pub mod criteria;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use criteria::{CriteriaSet, Criterion, RequestCriteria, RequestParams};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::post::Post;
pub use model::setting::Setting;
pub use model::tag::Tag;
pub use model::user::User;
pub use model::work::Work;
pub use model::{Attributes, EntityId, Model};
pub use query::{Columns, Operator, Page, Query, WhereClause};
pub use repo::{
    PostRepository, RepoError, RepoResult, Repository, SettingRepository, TagRepository,
    UserRepository, WorkRepository,
};
pub use service::{BlogService, BlogServiceError, SettingsService, SettingsServiceError};

/// Minimal health-check API for frontends and the CLI probe.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
