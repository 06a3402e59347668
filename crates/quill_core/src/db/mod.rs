//! Blog database: connection setup and schema upgrades.
//!
//! Everything above this module (repositories, services, the CLI) receives a
//! connection that is already on the latest blog schema.
//!
//! # Invariants
//! - `PRAGMA user_version` is the applied migration number.
//! - A file written by a newer build is refused rather than downgraded.
//! - A failed upgrade leaves the file on its previous version.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage failure. Repositories wrap it in `RepoError::Db` untouched.
#[derive(Debug)]
pub enum DbError {
    /// Any driver error outside a schema upgrade.
    Sqlite(rusqlite::Error),
    /// The blog file carries a schema this build does not know.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// One upgrade step failed; the whole upgrade was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl DbError {
    /// True when the file needs a newer build of the blog to open.
    pub fn is_schema_too_new(&self) -> bool {
        matches!(self, Self::UnsupportedSchemaVersion { .. })
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "blog database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "blog schema v{db_version} was written by a newer build (this build knows up to v{latest_supported})"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "blog schema upgrade to v{version} ({name}) failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
