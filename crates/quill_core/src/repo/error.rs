//! Repository error taxonomy.
//!
//! # Invariants
//! - `NotFound` is only produced by single-row lookups and is never used for
//!   transport failures.
//! - Storage failures are wrapped in `Db` unchanged.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for repository, criteria and query-layer operations.
#[derive(Debug)]
pub enum RepoError {
    /// The entity declaration cannot be served by this connection, or a
    /// boot-time criterion references something the entity does not declare.
    Configuration(String),
    /// Declared entity table is absent from the schema.
    MissingRequiredTable(&'static str),
    /// Declared column is absent from the entity table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Single-row lookup matched nothing.
    NotFound { table: &'static str, key: String },
    /// Caller referenced a column the entity does not declare.
    UnknownColumn { table: &'static str, column: String },
    /// Caller referenced a relation the entity does not declare.
    UnknownRelation {
        table: &'static str,
        relation: String,
    },
    /// Comparison operator text could not be parsed.
    InvalidOperator(String),
    /// Ad-hoc condition has an unsupported shape.
    InvalidCondition(String),
    Db(DbError),
    /// Persisted row cannot be decoded into the entity type.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this error makes the repository instance unusable.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::MissingRequiredTable(_)
                | Self::MissingRequiredColumn { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn not_found(table: &'static str, key: impl Display) -> Self {
        Self::NotFound {
            table,
            key: key.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(message) => write!(f, "repository misconfigured: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::NotFound { table, key } => write!(f, "no `{table}` row matches {key}"),
            Self::UnknownColumn { table, column } => {
                write!(f, "`{table}` has no column `{column}`")
            }
            Self::UnknownRelation { table, relation } => {
                write!(f, "`{table}` has no relation `{relation}`")
            }
            Self::InvalidOperator(op) => write!(f, "unsupported comparison operator `{op}`"),
            Self::InvalidCondition(message) => write!(f, "invalid condition: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
