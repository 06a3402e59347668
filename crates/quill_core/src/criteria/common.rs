//! Entity-agnostic criteria.

use crate::criteria::Criterion;
use crate::model::entity::Model;
use crate::query::{Direction, Operator, Query};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::repository::Repository;
use serde_json::Value;

/// Eager loads one declared relation for every row of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithRelation {
    relation: String,
}

impl WithRelation {
    /// Builds the criterion after checking that `M` declares `relation`.
    ///
    /// # Errors
    /// - `RepoError::Configuration` when the relation is not declared; boot
    ///   hooks propagate it as a construction failure.
    pub fn for_model<M: Model>(relation: &str) -> RepoResult<Self> {
        if M::relation(relation).is_none() {
            return Err(RepoError::Configuration(format!(
                "`{}` declares no relation `{relation}`",
                M::TABLE
            )));
        }
        Ok(Self {
            relation: relation.to_string(),
        })
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }
}

impl<M: Model> Criterion<M> for WithRelation {
    fn apply(&self, query: Query<M>, _repository: &Repository<'_, M>) -> Query<M> {
        query.with(self.relation.clone())
    }

    fn name(&self) -> &'static str {
        "with_relation"
    }
}

/// Single `column <op> value` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl Where {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::Eq, value)
    }
}

impl<M: Model> Criterion<M> for Where {
    fn apply(&self, query: Query<M>, _repository: &Repository<'_, M>) -> Query<M> {
        query.where_op(self.column.clone(), self.operator, self.value.clone())
    }

    fn name(&self) -> &'static str {
        "where"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

impl<M: Model> Criterion<M> for OrderBy {
    fn apply(&self, query: Query<M>, _repository: &Repository<'_, M>) -> Query<M> {
        query.order_by(self.column.clone(), self.direction)
    }

    fn name(&self) -> &'static str {
        "order_by"
    }
}

/// Caps unpaginated reads. `paginate` replaces it with the page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(pub u32);

impl<M: Model> Criterion<M> for Limit {
    fn apply(&self, query: Query<M>, _repository: &Repository<'_, M>) -> Query<M> {
        query.limit(self.0)
    }

    fn name(&self) -> &'static str {
        "limit"
    }
}
