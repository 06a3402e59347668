//! Generic criteria-aware repository.
//!
//! # Responsibility
//! - Serve CRUD for one entity type `M` over a borrowed connection.
//! - Apply the repository's criteria to every read, never to writes.
//!
//! # Invariants
//! - Construction fails unless `M` matches the live schema.
//! - Every read starts from a fresh `Query::new()`; no read observes state
//!   left behind by an earlier one.
//! - `skip_criteria(true)` stays in effect until `skip_criteria(false)` or
//!   `reset_scope()`; `without_criteria()` is the single-read alternative.

use crate::criteria::{CriteriaSet, Criterion};
use crate::model::entity::{Attributes, EntityId, Model};
use crate::query::{self, Columns, Page, Query, WhereClause};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::ensure_model_ready;
use log::{debug, error, info};
use rusqlite::Connection;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::time::Instant;

/// CRUD facade for entity `M` with composable read criteria.
pub struct Repository<'conn, M: Model> {
    conn: &'conn Connection,
    criteria: CriteriaSet<M>,
}

impl<'conn, M: Model> Repository<'conn, M> {
    /// Builds a repository with no criteria after validating `M`.
    ///
    /// # Errors
    /// - Configuration variants of `RepoError` when the declaration does not
    ///   match the schema; the error is final for this entity/connection pair.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if let Err(err) = ensure_model_ready::<M>(conn) {
            error!(
                "event=repo_init module=repo status=error model={} error_code=repo_misconfigured error={err}",
                M::TABLE
            );
            return Err(err);
        }
        Ok(Self {
            conn,
            criteria: CriteriaSet::new(),
        })
    }

    /// Builds a repository and runs `hook` once to install default criteria.
    ///
    /// A failing hook fails construction.
    pub fn boot(
        conn: &'conn Connection,
        hook: impl FnOnce(&mut Self) -> RepoResult<()>,
    ) -> RepoResult<Self> {
        let mut repository = Self::try_new(conn)?;
        if let Err(err) = hook(&mut repository) {
            error!(
                "event=repo_boot module=repo status=error model={} error_code=boot_failed error={err}",
                M::TABLE
            );
            return Err(err);
        }
        info!(
            "event=repo_boot module=repo status=ok model={} criteria={}",
            M::TABLE,
            repository.criteria.names().join(",")
        );
        Ok(repository)
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    pub fn push_criteria(&mut self, criterion: impl Criterion<M> + 'static) -> &mut Self {
        self.criteria.push(criterion);
        self
    }

    pub fn criteria(&self) -> &CriteriaSet<M> {
        &self.criteria
    }

    pub fn skip_criteria(&mut self, enabled: bool) -> &mut Self {
        self.criteria.skip(enabled);
        self
    }

    pub fn reset_scope(&mut self) -> &mut Self {
        self.criteria.reset();
        self
    }

    /// Returns a fresh handle with every active criterion folded in.
    pub fn apply_criteria(&self) -> Query<M> {
        self.criteria.apply(Query::new(), self)
    }

    /// Returns a view whose single read ignores all criteria.
    pub fn without_criteria(&self) -> Unscoped<'_, 'conn, M> {
        Unscoped { repository: self }
    }

    pub fn all(&self, columns: &Columns) -> RepoResult<Vec<M>> {
        self.all_in(self.apply_criteria(), columns)
    }

    pub fn paginate(&self, per_page: u32, page: u32, columns: &Columns) -> RepoResult<Page<M>> {
        self.paginate_in(self.apply_criteria(), per_page, page, columns)
    }

    /// Looks a row up by primary key through the criteria.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when no row (visible to the criteria) has `id`.
    pub fn find(&self, id: EntityId, columns: &Columns) -> RepoResult<M> {
        self.find_in(self.apply_criteria(), id, columns)
    }

    pub fn find_by(&self, attribute: &str, value: impl Into<Value>, columns: &Columns) -> RepoResult<M> {
        self.find_by_in(self.apply_criteria(), attribute, value.into(), columns)
    }

    pub fn find_all_by(
        &self,
        attribute: &str,
        value: impl Into<Value>,
        columns: &Columns,
    ) -> RepoResult<Vec<M>> {
        let query = self.apply_criteria().where_eq(attribute, value);
        self.all_in(query, columns)
    }

    /// Criteria first, then every clause AND-combined.
    pub fn find_where(&self, conditions: &[WhereClause], columns: &Columns) -> RepoResult<Vec<M>> {
        self.find_where_in(self.apply_criteria(), conditions, columns)
    }

    /// Criteria-filtered `(key, value)` pairs, e.g. for select boxes.
    pub fn lists(&self, value_column: &str, key_column: &str) -> RepoResult<Vec<(Value, Value)>> {
        let started_at = Instant::now();
        let result = self
            .apply_criteria()
            .pluck(self.conn, value_column, key_column);
        self.observe("lists", started_at, result, Vec::len)
    }

    /// Registered criteria plus `criterion`, for this read only.
    pub fn get_by_criteria(
        &self,
        criterion: &dyn Criterion<M>,
        columns: &Columns,
    ) -> RepoResult<Vec<M>> {
        let query = criterion.apply(self.apply_criteria(), self);
        self.all_in(query, columns)
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.count_in(self.apply_criteria())
    }

    /// Inserts `data` and returns the stored row. Criteria are not consulted.
    pub fn create(&self, data: &Attributes) -> RepoResult<M> {
        let started_at = Instant::now();
        let id = query::insert::<M>(self.conn, data).map_err(|err| self.write_failed("create", err))?;
        let created = Query::<M>::new().find_or_fail(self.conn, id, &Columns::All)?;
        info!(
            "event=repo_write module=repo status=ok model={} op=create id={id} duration_ms={}",
            M::TABLE,
            started_at.elapsed().as_millis()
        );
        Ok(created)
    }

    /// Bulk update of rows where `identifier_field == id`; criteria are not
    /// consulted. Returns the affected row count.
    pub fn update(
        &self,
        data: &Attributes,
        id: impl Into<Value>,
        identifier_field: &str,
    ) -> RepoResult<usize> {
        let changed = query::update_where::<M>(self.conn, identifier_field, id, data)
            .map_err(|err| self.write_failed("update", err))?;
        info!(
            "event=repo_write module=repo status=ok model={} op=update rows={changed}",
            M::TABLE
        );
        Ok(changed)
    }

    /// Loads row `id` (unfiltered), merges `data` into it and saves it.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when row `id` does not exist.
    pub fn update_rich(&self, data: &Attributes, id: EntityId) -> RepoResult<bool> {
        let mut records = Query::<M>::new()
            .where_eq(M::PRIMARY_KEY, id)
            .limit(1)
            .fetch_records(self.conn, &Columns::All)?;
        let Some(mut record) = records.pop() else {
            return Err(RepoError::not_found(M::TABLE, format!("{}={id}", M::PRIMARY_KEY)));
        };
        let saved = query::fill_save::<M>(self.conn, &mut record, data)
            .map_err(|err| self.write_failed("update_rich", err))?;
        info!(
            "event=repo_write module=repo status=ok model={} op=update_rich id={id} saved={saved}",
            M::TABLE
        );
        Ok(saved)
    }

    /// Deletes row `id`; criteria are not consulted.
    pub fn delete(&self, id: EntityId) -> RepoResult<usize> {
        let removed =
            query::destroy::<M>(self.conn, id).map_err(|err| self.write_failed("delete", err))?;
        info!(
            "event=repo_write module=repo status=ok model={} op=delete id={id} rows={removed}",
            M::TABLE
        );
        Ok(removed)
    }

    fn all_in(&self, query: Query<M>, columns: &Columns) -> RepoResult<Vec<M>> {
        let started_at = Instant::now();
        let result = query.get(self.conn, columns);
        self.observe("get", started_at, result, Vec::len)
    }

    fn paginate_in(
        &self,
        query: Query<M>,
        per_page: u32,
        page: u32,
        columns: &Columns,
    ) -> RepoResult<Page<M>> {
        let started_at = Instant::now();
        let result = query.paginate(self.conn, per_page, page, columns);
        self.observe("paginate", started_at, result, |page| page.items.len())
    }

    fn find_in(&self, query: Query<M>, id: EntityId, columns: &Columns) -> RepoResult<M> {
        let started_at = Instant::now();
        let result = query.find_or_fail(self.conn, id, columns);
        self.observe("find", started_at, result, |_| 1)
    }

    fn find_by_in(
        &self,
        query: Query<M>,
        attribute: &str,
        value: Value,
        columns: &Columns,
    ) -> RepoResult<M> {
        let started_at = Instant::now();
        let key = format!("{attribute}={value}");
        let result = query
            .where_eq(attribute, value)
            .first(self.conn, columns)
            .and_then(|row| row.ok_or_else(|| RepoError::not_found(M::TABLE, key)));
        self.observe("find_by", started_at, result, |_| 1)
    }

    fn find_where_in(
        &self,
        query: Query<M>,
        conditions: &[WhereClause],
        columns: &Columns,
    ) -> RepoResult<Vec<M>> {
        let query = conditions
            .iter()
            .cloned()
            .map(WhereClause::into_comparison)
            .fold(query, |query, comparison| {
                query.where_op(comparison.column, comparison.operator, comparison.value)
            });
        self.all_in(query, columns)
    }

    fn count_in(&self, query: Query<M>) -> RepoResult<u64> {
        let started_at = Instant::now();
        let result = query.count(self.conn);
        self.observe("count", started_at, result, |_| 1)
    }

    fn observe<T>(
        &self,
        op: &'static str,
        started_at: Instant,
        result: RepoResult<T>,
        rows: impl FnOnce(&T) -> usize,
    ) -> RepoResult<T> {
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(value) => debug!(
                "event=repo_read module=repo status=ok model={} op={op} rows={} skipped={} duration_ms={duration_ms}",
                M::TABLE,
                rows(value),
                self.criteria.is_skipped()
            ),
            Err(err) if err.is_not_found() => debug!(
                "event=repo_read module=repo status=not_found model={} op={op} duration_ms={duration_ms}",
                M::TABLE
            ),
            Err(err) => error!(
                "event=repo_read module=repo status=error model={} op={op} duration_ms={duration_ms} error_code=repo_read_failed error={err}",
                M::TABLE
            ),
        }
        result
    }

    fn write_failed(&self, op: &str, err: RepoError) -> RepoError {
        error!(
            "event=repo_write module=repo status=error model={} op={op} error_code=repo_write_failed error={err}",
            M::TABLE
        );
        err
    }
}

impl<M: Model> Debug for Repository<'_, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("model", &M::TABLE)
            .field("criteria", &self.criteria)
            .finish()
    }
}

/// Read view that bypasses criteria for exactly one call.
///
/// Every method consumes the view, so it cannot leak into a later read.
pub struct Unscoped<'r, 'conn, M: Model> {
    repository: &'r Repository<'conn, M>,
}

impl<M: Model> Unscoped<'_, '_, M> {
    pub fn all(self, columns: &Columns) -> RepoResult<Vec<M>> {
        self.repository.all_in(Query::new(), columns)
    }

    pub fn paginate(self, per_page: u32, page: u32, columns: &Columns) -> RepoResult<Page<M>> {
        self.repository
            .paginate_in(Query::new(), per_page, page, columns)
    }

    pub fn find(self, id: EntityId, columns: &Columns) -> RepoResult<M> {
        self.repository.find_in(Query::new(), id, columns)
    }

    pub fn find_by(self, attribute: &str, value: impl Into<Value>, columns: &Columns) -> RepoResult<M> {
        self.repository
            .find_by_in(Query::new(), attribute, value.into(), columns)
    }

    pub fn find_all_by(
        self,
        attribute: &str,
        value: impl Into<Value>,
        columns: &Columns,
    ) -> RepoResult<Vec<M>> {
        self.repository
            .all_in(Query::new().where_eq(attribute, value), columns)
    }

    pub fn find_where(self, conditions: &[WhereClause], columns: &Columns) -> RepoResult<Vec<M>> {
        self.repository
            .find_where_in(Query::new(), conditions, columns)
    }

    pub fn count(self) -> RepoResult<u64> {
        self.repository.count_in(Query::new())
    }
}
