//! Query handles over SQLite.
//!
//! # Responsibility
//! - Describe a read as an immutable value (`Query<M>`) that criteria can
//!   transform step by step.
//! - Execute handles against a connection: rows, first row, pages, counts.
//! - Provide the unfiltered write primitives repositories build on.
//!
//! # Invariants
//! - Builders never touch the database; only terminal methods do.
//! - Names are checked against the entity declaration when a handle is
//!   executed, so an invalid handle fails before any SQL runs.

mod condition;
mod eager;
mod page;
mod sql;
mod write;

pub use condition::{Columns, Comparison, Condition, Direction, Operator, WhereClause};
pub use page::{normalize_page, Page, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use write::{destroy, fill_save, insert, update_where};

use crate::model::entity::{Attributes, EntityId, Model};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::Connection;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// Entity handle: the in-progress description of one read over `M`.
pub struct Query<M: Model> {
    conditions: Vec<Condition>,
    relations: Vec<String>,
    orders: Vec<(String, Direction)>,
    limit: Option<u32>,
    offset: Option<u32>,
    marker: PhantomData<fn() -> M>,
}

impl<M: Model> Query<M> {
    /// Returns the base handle: every row of `M::TABLE`, no relations.
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            relations: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            marker: PhantomData,
        }
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn where_op(self, column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.filter(Condition::Compare(Comparison::new(column, operator, value)))
    }

    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    /// Adds an OR-group; the handle matches rows satisfying any comparison.
    pub fn where_any(self, comparisons: Vec<Comparison>) -> Self {
        self.filter(Condition::Any(comparisons))
    }

    /// Keeps rows with at least one related row matching the comparison.
    pub fn where_has(
        self,
        relation: impl Into<String>,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.filter(Condition::Has {
            relation: relation.into(),
            comparison: Comparison::new(column, operator, value),
        })
    }

    /// Eager loads a declared relation; repeated names load once.
    pub fn with(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        if !self.relations.contains(&relation) {
            self.relations.push(relation);
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.orders.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn orders(&self) -> &[(String, Direction)] {
        &self.orders
    }

    pub fn limit_value(&self) -> Option<u32> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u32> {
        self.offset
    }

    /// Executes the handle and returns raw rows with relations nested.
    pub fn fetch_records(&self, conn: &Connection, columns: &Columns) -> RepoResult<Vec<Attributes>> {
        let relations = self
            .relations
            .iter()
            .map(|name| {
                M::relation(name).ok_or_else(|| RepoError::UnknownRelation {
                    table: M::TABLE,
                    relation: name.clone(),
                })
            })
            .collect::<RepoResult<Vec<_>>>()?;

        let mut records = sql::render_select(self, columns)?.fetch(conn)?;
        if records.is_empty() {
            return Ok(records);
        }
        for def in relations {
            eager::load_relation(conn, def.name, &def.relation, &mut records)?;
        }
        Ok(records)
    }

    pub fn get(&self, conn: &Connection, columns: &Columns) -> RepoResult<Vec<M>> {
        self.fetch_records(conn, columns)?
            .into_iter()
            .map(decode::<M>)
            .collect()
    }

    pub fn first(&self, conn: &Connection, columns: &Columns) -> RepoResult<Option<M>> {
        let mut rows = self.clone().limit(1).get(conn, columns)?;
        Ok(rows.pop())
    }

    /// Like [`Query::first`] but reports an empty result as `NotFound`.
    pub fn first_or_fail(&self, conn: &Connection, columns: &Columns) -> RepoResult<M> {
        self.first(conn, columns)?
            .ok_or_else(|| RepoError::not_found(M::TABLE, self.describe()))
    }

    pub fn find_or_fail(&self, conn: &Connection, id: EntityId, columns: &Columns) -> RepoResult<M> {
        self.clone()
            .where_eq(M::PRIMARY_KEY, id)
            .first(conn, columns)?
            .ok_or_else(|| RepoError::not_found(M::TABLE, format!("{}={id}", M::PRIMARY_KEY)))
    }

    pub fn count(&self, conn: &Connection) -> RepoResult<u64> {
        let stmt = sql::render_count(self)?;
        let total: i64 = conn.query_row(
            &stmt.sql,
            rusqlite::params_from_iter(stmt.params.iter()),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// Runs a counted, offset read. The handle's own limit/offset are replaced.
    pub fn paginate(
        &self,
        conn: &Connection,
        per_page: u32,
        page: u32,
        columns: &Columns,
    ) -> RepoResult<Page<M>> {
        let (per_page, page) = normalize_page(per_page, page);
        let total = self.count(conn)?;
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let items = if u64::from(offset) >= total {
            Vec::new()
        } else {
            self.clone().limit(per_page).offset(offset).get(conn, columns)?
        };
        Ok(Page::new(items, total, per_page, page))
    }

    /// Returns `(key, value)` pairs of two columns, in handle order.
    pub fn pluck(
        &self,
        conn: &Connection,
        value_column: &str,
        key_column: &str,
    ) -> RepoResult<Vec<(Value, Value)>> {
        let projection = Columns::only([key_column, value_column]);
        let rows = self.fetch_records(conn, &projection)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let key = row.get(key_column).cloned().unwrap_or(Value::Null);
                let value = row.get(value_column).cloned().unwrap_or(Value::Null);
                (key, value)
            })
            .collect())
    }

    fn describe(&self) -> String {
        if self.conditions.is_empty() {
            return "any row".to_string();
        }
        self.conditions
            .iter()
            .map(|condition| match condition {
                Condition::Compare(c) => format!("{} {} {}", c.column, c.operator, c.value),
                Condition::Any(group) => format!("any of {} comparisons", group.len()),
                Condition::Has { relation, comparison } => format!(
                    "{relation}.{} {} {}",
                    comparison.column, comparison.operator, comparison.value
                ),
            })
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl<M: Model> Default for Query<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for Query<M> {
    fn clone(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            relations: self.relations.clone(),
            orders: self.orders.clone(),
            limit: self.limit,
            offset: self.offset,
            marker: PhantomData,
        }
    }
}

impl<M: Model> PartialEq for Query<M> {
    fn eq(&self, other: &Self) -> bool {
        self.conditions == other.conditions
            && self.relations == other.relations
            && self.orders == other.orders
            && self.limit == other.limit
            && self.offset == other.offset
    }
}

impl<M: Model> Debug for Query<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("table", &M::TABLE)
            .field("conditions", &self.conditions)
            .field("relations", &self.relations)
            .field("orders", &self.orders)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}

pub(crate) fn decode<M: Model>(record: Attributes) -> RepoResult<M> {
    serde_json::from_value(Value::Object(record))
        .map_err(|err| RepoError::InvalidData(format!("cannot decode `{}` row: {err}", M::TABLE)))
}
