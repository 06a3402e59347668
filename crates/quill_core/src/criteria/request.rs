//! Request-derived criteria.
//!
//! Translates listing-screen parameters into handle transformations:
//!
//! | parameter      | example                      | effect                           |
//! |----------------|------------------------------|----------------------------------|
//! | `search`       | `rust` / `name:rust;slug:go` | OR over searchable / AND per pair |
//! | `searchFields` | `name:=`                     | operator override (`=`, `like`)  |
//! | `orderBy`      | `created_at`                 | sort column                      |
//! | `sortedBy`     | `desc`                       | sort direction, default `asc`    |
//! | `with`         | `posts;author`               | eager loaded relations           |
//! | `limit`        | `20`                         | row cap, clamped to 1..=100      |
//!
//! # Invariants
//! - Unknown parameters, non-searchable fields, undeclared relations and
//!   malformed values are ignored rather than reported.
//! - Values are always bound parameters.

use crate::criteria::Criterion;
use crate::model::entity::Model;
use crate::query::{Comparison, Direction, Operator, Query};
use crate::repo::repository::Repository;
use log::debug;
use std::collections::BTreeMap;

/// Upper bound applied to the `limit` parameter.
pub const REQUEST_LIMIT_MAX: u32 = 100;

const PAIR_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = ':';

/// Caller-supplied request parameters (already URL-decoded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the trimmed value, treating blank values as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Applies [`RequestParams`] to any entity's handle.
#[derive(Debug, Clone, Default)]
pub struct RequestCriteria {
    params: RequestParams,
}

impl RequestCriteria {
    pub fn new(params: RequestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    fn apply_search<M: Model>(&self, query: Query<M>) -> Query<M> {
        let Some(search) = self.params.get("search") else {
            return query;
        };
        let overrides = parse_pairs(self.params.get("searchFields").unwrap_or_default());
        let operator_for = |field: &str| -> Option<Operator> {
            let declared = M::searchable(field)?;
            let requested = overrides
                .iter()
                .find(|(name, _)| name == field)
                .and_then(|(_, op)| op.parse::<Operator>().ok())
                .filter(|op| matches!(op, Operator::Eq | Operator::Like));
            Some(requested.unwrap_or(declared))
        };

        if search.contains(FIELD_SEPARATOR) {
            parse_pairs(search)
                .into_iter()
                .filter_map(|(field, value)| {
                    operator_for(field.as_str()).map(|op| search_comparison(field, op, &value))
                })
                .fold(query, |query, comparison| {
                    query.where_op(comparison.column, comparison.operator, comparison.value)
                })
        } else {
            let comparisons: Vec<Comparison> = M::SEARCHABLE
                .iter()
                .filter_map(|(field, _)| {
                    operator_for(*field)
                        .map(|op| search_comparison((*field).to_string(), op, search))
                })
                .collect();
            if comparisons.is_empty() {
                query
            } else {
                query.where_any(comparisons)
            }
        }
    }

    fn apply_order<M: Model>(&self, query: Query<M>) -> Query<M> {
        match self.params.get("orderBy") {
            Some(column) if M::has_column(column) => {
                let direction = self
                    .params
                    .get("sortedBy")
                    .and_then(Direction::parse)
                    .unwrap_or_default();
                query.order_by(column, direction)
            }
            _ => query,
        }
    }

    fn apply_with<M: Model>(&self, query: Query<M>) -> Query<M> {
        self.params
            .get("with")
            .unwrap_or_default()
            .split(PAIR_SEPARATOR)
            .map(str::trim)
            .filter(|name| M::relation(name).is_some())
            .fold(query, |query, name| query.with(name))
    }

    fn apply_limit<M: Model>(&self, query: Query<M>) -> Query<M> {
        match self.params.get("limit").and_then(|value| value.parse::<u32>().ok()) {
            Some(limit) => query.limit(limit.clamp(1, REQUEST_LIMIT_MAX)),
            None => query,
        }
    }
}

impl<M: Model> Criterion<M> for RequestCriteria {
    fn apply(&self, query: Query<M>, _repository: &Repository<'_, M>) -> Query<M> {
        let query = self.apply_search(query);
        let query = self.apply_order(query);
        let query = self.apply_with(query);
        let query = self.apply_limit(query);
        debug!(
            "event=criteria_apply module=criteria name=request model={} conditions={} relations={}",
            M::TABLE,
            query.conditions().len(),
            query.relations().len()
        );
        query
    }

    fn name(&self) -> &'static str {
        "request"
    }
}

fn search_comparison(field: String, operator: Operator, value: &str) -> Comparison {
    match operator {
        Operator::Like => Comparison::contains(field, value),
        _ => Comparison::new(field, operator, value.to_string()),
    }
}

/// Splits `a:1;b:2` into `[("a", "1"), ("b", "2")]`, dropping malformed parts.
fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(PAIR_SEPARATOR)
        .filter_map(|part| part.split_once(FIELD_SEPARATOR))
        .map(|(field, value)| (field.trim().to_string(), value.trim().to_string()))
        .filter(|(field, value)| !field.is_empty() && !value.is_empty())
        .collect()
}
