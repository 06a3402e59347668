//! Eager loading of declared relations.
//!
//! One query per requested relation, keyed on the parent rows already
//! fetched, regardless of how many parents there are.

use crate::model::entity::{Attributes, Relation};
use crate::query::sql::{qualified, quote, to_sql_value, Statement};
use crate::repo::error::RepoResult;
use rusqlite::Connection;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

const PIVOT_OWNER_ALIAS: &str = "__pivot_owner";

/// Loads `relation` for every record and nests the result under `name`.
///
/// Belongs-to relations nest an object (or `null`); the other kinds nest an
/// array, empty when nothing is linked.
pub(crate) fn load_relation(
    conn: &Connection,
    name: &str,
    relation: &Relation,
    records: &mut [Attributes],
) -> RepoResult<()> {
    match *relation {
        Relation::BelongsTo {
            related,
            foreign_key,
            owner_key,
            ..
        } => {
            let keys = collect_keys(records, foreign_key);
            let order = qualified(related, owner_key);
            let related_rows = fetch_in(conn, related, owner_key, &keys, None, &order)?;
            let by_key: HashMap<String, Attributes> = related_rows
                .into_iter()
                .filter_map(|row| key_of(&row, owner_key).map(|key| (key, row)))
                .collect();
            for record in records.iter_mut() {
                let nested = key_of(record, foreign_key)
                    .and_then(|key| by_key.get(&key).cloned())
                    .map_or(Value::Null, Value::Object);
                record.insert(name.to_string(), nested);
            }
        }
        Relation::HasMany {
            related,
            foreign_key,
            local_key,
            ..
        } => {
            let keys = collect_keys(records, local_key);
            let order = qualified(related, "rowid");
            let related_rows = fetch_in(conn, related, foreign_key, &keys, None, &order)?;
            let grouped = group_by(related_rows, foreign_key, false);
            nest_groups(records, name, local_key, grouped);
        }
        Relation::BelongsToMany {
            related,
            pivot,
            foreign_pivot_key,
            related_pivot_key,
            local_key,
            related_key,
            ..
        } => {
            let keys = collect_keys(records, local_key);
            let join = format!(
                "{}.*, {} AS {} FROM {} INNER JOIN {} ON {} = {}",
                quote(related),
                qualified(pivot, foreign_pivot_key),
                quote(PIVOT_OWNER_ALIAS),
                quote(related),
                quote(pivot),
                qualified(pivot, related_pivot_key),
                qualified(related, related_key)
            );
            let order = qualified(related, related_key);
            let related_rows =
                fetch_in(conn, pivot, foreign_pivot_key, &keys, Some(&join), &order)?;
            let grouped = group_by(related_rows, PIVOT_OWNER_ALIAS, true);
            nest_groups(records, name, local_key, grouped);
        }
    }
    Ok(())
}

fn key_of(record: &Attributes, column: &str) -> Option<String> {
    match record.get(column) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.to_string()),
    }
}

fn collect_keys(records: &[Attributes], column: &str) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    records
        .iter()
        .filter_map(|record| record.get(column))
        .filter(|value| !value.is_null() && seen.insert(value.to_string()))
        .cloned()
        .collect()
}

/// `SELECT <projection> WHERE <table>.<column> IN (keys)`; `projection`
/// defaults to `<table>.* FROM <table>`.
fn fetch_in(
    conn: &Connection,
    table: &str,
    column: &str,
    keys: &[Value],
    projection: Option<&str>,
    order: &str,
) -> RepoResult<Vec<Attributes>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let projection = projection
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.* FROM {}", quote(table), quote(table)));
    let placeholders = vec!["?"; keys.len()].join(", ");
    let stmt = Statement {
        sql: format!(
            "SELECT {projection} WHERE {} IN ({placeholders}) ORDER BY {order}",
            qualified(table, column)
        ),
        params: keys.iter().map(to_sql_value).collect(),
    };
    stmt.fetch(conn)
}

fn group_by(
    rows: Vec<Attributes>,
    column: &str,
    strip_column: bool,
) -> HashMap<String, Vec<Value>> {
    let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
    for mut row in rows {
        let Some(key) = key_of(&row, column) else {
            continue;
        };
        if strip_column {
            row.remove(column);
        }
        grouped.entry(key).or_default().push(Value::Object(row));
    }
    grouped
}

fn nest_groups(
    records: &mut [Attributes],
    name: &str,
    local_key: &str,
    grouped: HashMap<String, Vec<Value>>,
) {
    for record in records.iter_mut() {
        let items = key_of(record, local_key)
            .and_then(|key| grouped.get(&key).cloned())
            .unwrap_or_default();
        record.insert(name.to_string(), Value::Array(items));
    }
}
