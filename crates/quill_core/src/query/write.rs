//! Unfiltered write primitives.
//!
//! Nothing here looks at criteria: callers pass the exact row selection.

use crate::model::entity::{Attributes, EntityId, Model};
use crate::query::sql::{entity_column, quote, render_update, to_sql_value, Statement};
use crate::query::Query;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::Connection;
use serde_json::Value;

/// Inserts one row and returns its primary key.
pub fn insert<M: Model>(conn: &Connection, data: &Attributes) -> RepoResult<EntityId> {
    let mut columns = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len());
    for (column, value) in data {
        entity_column::<M>(column)?;
        columns.push(quote(column));
        params.push(to_sql_value(value));
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote(M::TABLE))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(M::TABLE),
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        )
    };
    Statement { sql, params }.execute(conn)?;

    match data.get(M::PRIMARY_KEY).and_then(Value::as_i64) {
        Some(id) => Ok(id),
        None => Ok(conn.last_insert_rowid()),
    }
}

/// Updates every row where `column == value`; returns the affected count.
pub fn update_where<M: Model>(
    conn: &Connection,
    column: &str,
    value: impl Into<Value>,
    data: &Attributes,
) -> RepoResult<usize> {
    if data.keys().all(|key| key == M::PRIMARY_KEY) {
        return Ok(0);
    }
    let selection = Query::<M>::new().where_eq(column, value);
    render_update(&selection, data)?.execute(conn)
}

/// Deletes the row with primary key `id`; returns the affected count.
pub fn destroy<M: Model>(conn: &Connection, id: EntityId) -> RepoResult<usize> {
    let stmt = Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?",
            quote(M::TABLE),
            quote(M::PRIMARY_KEY)
        ),
        params: vec![to_sql_value(&Value::from(id))],
    };
    stmt.execute(conn)
}

/// Merges `data` into a loaded row and writes the row back by primary key.
///
/// The write is keyed on the loaded row; a primary key in `data` is ignored.
/// Returns whether exactly one row was written.
pub fn fill_save<M: Model>(
    conn: &Connection,
    record: &mut Attributes,
    data: &Attributes,
) -> RepoResult<bool> {
    let Some(id) = record.get(M::PRIMARY_KEY).and_then(Value::as_i64) else {
        return Err(RepoError::InvalidData(format!(
            "`{}` row has no integer `{}`",
            M::TABLE,
            M::PRIMARY_KEY
        )));
    };

    for (column, value) in data {
        entity_column::<M>(column)?;
        if column != M::PRIMARY_KEY {
            record.insert(column.clone(), value.clone());
        }
    }
    record.retain(|column, _| M::has_column(column));
    if M::TIMESTAMPS && !data.contains_key("updated_at") {
        // refreshed by the UPDATE itself
        record.remove("updated_at");
    }

    let changed = update_where::<M>(conn, M::PRIMARY_KEY, id, record)?;
    Ok(changed == 1)
}
