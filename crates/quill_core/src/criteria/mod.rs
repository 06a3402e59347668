//! Composable query criteria.
//!
//! # Responsibility
//! - Define the `Criterion` contract: a pure `Query<M> -> Query<M>` step.
//! - Hold a repository's criteria in registration order, with skip control.
//!
//! # Invariants
//! - Criteria never execute queries and never write.
//! - Folding applies criteria strictly in the order they were pushed.
//! - `reset` clears the skip flag only; registered criteria are kept.

mod common;
mod post;
mod request;

pub use common::{Limit, OrderBy, Where, WithRelation};
pub use post::{ByAuthor, LatestFirst, Published, WithAuthor, WithTag, WithTags};
pub use request::{RequestCriteria, RequestParams, REQUEST_LIMIT_MAX};

use crate::model::entity::Model;
use crate::query::Query;
use crate::repo::repository::Repository;
use std::fmt::{Debug, Formatter};

/// One reusable transformation of a query handle.
///
/// Implementations must be total: any handle in, a handle out. Absence of
/// matching rows is a normal (empty) result, never a criterion failure.
pub trait Criterion<M: Model> {
    fn apply(&self, query: Query<M>, repository: &Repository<'_, M>) -> Query<M>;

    /// Short label used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<M, F> Criterion<M> for F
where
    M: Model,
    F: Fn(Query<M>, &Repository<'_, M>) -> Query<M>,
{
    fn apply(&self, query: Query<M>, repository: &Repository<'_, M>) -> Query<M> {
        self(query, repository)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Ordered criteria owned by one repository.
pub struct CriteriaSet<M: Model> {
    criteria: Vec<Box<dyn Criterion<M>>>,
    skip: bool,
}

impl<M: Model> CriteriaSet<M> {
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
            skip: false,
        }
    }

    /// Appends `criterion` after every criterion already registered.
    pub fn push(&mut self, criterion: impl Criterion<M> + 'static) {
        self.criteria.push(Box::new(criterion));
    }

    pub fn all(&self) -> &[Box<dyn Criterion<M>>] {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn skip(&mut self, enabled: bool) {
        self.skip = enabled;
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn reset(&mut self) {
        self.skip = false;
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.criteria.iter().map(|criterion| criterion.name()).collect()
    }

    /// Folds every criterion over `query`, or returns it untouched when
    /// skipped.
    pub fn apply(&self, query: Query<M>, repository: &Repository<'_, M>) -> Query<M> {
        if self.skip {
            return query;
        }
        self.criteria
            .iter()
            .fold(query, |query, criterion| criterion.apply(query, repository))
    }
}

impl<M: Model> Default for CriteriaSet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Debug for CriteriaSet<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriteriaSet")
            .field("criteria", &self.names())
            .field("skip", &self.skip)
            .finish()
    }
}
