//! SQL rendering and value conversion for query handles.
//!
//! # Invariants
//! - Identifiers reaching SQL text come from entity declarations (`'static`
//!   names) after validation; caller-supplied values are always bound.
//! - Every column reference in a `WHERE` clause is table-qualified so
//!   correlated `EXISTS` subqueries stay unambiguous.

use crate::model::entity::{Attributes, Model, Relation};
use crate::query::condition::{Columns, Comparison, Condition, Operator};
use crate::query::Query;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{Number, Value};

/// Rendered statement plus positional parameters.
#[derive(Debug, Default)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub(crate) fn fetch(&self, conn: &Connection) -> RepoResult<Vec<Attributes>> {
        let mut stmt = conn.prepare(&self.sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(self.params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_record(row, &names)?);
        }
        Ok(records)
    }

    pub(crate) fn execute(&self, conn: &Connection) -> RepoResult<usize> {
        Ok(conn.execute(&self.sql, params_from_iter(self.params.iter()))?)
    }
}

pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

pub(crate) fn qualified(table: &str, column: &str) -> String {
    format!("{}.{}", quote(table), quote(column))
}

pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integer), _) => SqlValue::Integer(integer),
            (None, Some(real)) => SqlValue::Real(real),
            (None, None) => SqlValue::Text(number.to_string()),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(integer) => Value::from(integer),
        ValueRef::Real(real) => Number::from_f64(real).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

fn read_record(row: &Row<'_>, names: &[String]) -> RepoResult<Attributes> {
    let mut record = Attributes::new();
    for (index, name) in names.iter().enumerate() {
        record.insert(name.clone(), from_sql_ref(row.get_ref(index)?));
    }
    Ok(record)
}

/// Checks `column` against the entity declaration and returns it qualified.
pub(crate) fn entity_column<M: Model>(column: &str) -> RepoResult<String> {
    if !M::has_column(column) {
        return Err(RepoError::UnknownColumn {
            table: M::TABLE,
            column: column.to_string(),
        });
    }
    Ok(qualified(M::TABLE, column))
}

fn select_list<M: Model>(columns: &Columns) -> RepoResult<String> {
    match columns {
        Columns::All => Ok(format!("{}.*", quote(M::TABLE))),
        Columns::Only(names) if names.is_empty() => Ok(format!("{}.*", quote(M::TABLE))),
        Columns::Only(names) => {
            let rendered = names
                .iter()
                .map(|name| entity_column::<M>(name))
                .collect::<RepoResult<Vec<_>>>()?;
            Ok(rendered.join(", "))
        }
    }
}

fn push_comparison(
    column_sql: &str,
    comparison: &Comparison,
    out: &mut String,
    params: &mut Vec<SqlValue>,
) {
    match (comparison.operator, &comparison.value) {
        (Operator::Eq, Value::Null) => out.push_str(&format!("{column_sql} IS NULL")),
        (Operator::NotEq, Value::Null) => out.push_str(&format!("{column_sql} IS NOT NULL")),
        (Operator::In, value) => {
            let items: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                single => vec![single],
            };
            if items.is_empty() {
                out.push_str("0 = 1");
                return;
            }
            let placeholders = vec!["?"; items.len()].join(", ");
            out.push_str(&format!("{column_sql} IN ({placeholders})"));
            params.extend(items.into_iter().map(to_sql_value));
        }
        (Operator::Like | Operator::NotLike, value) if comparison.escaped => {
            out.push_str(&format!(
                "{column_sql} {} ? ESCAPE '\\'",
                comparison.operator.as_sql()
            ));
            params.push(to_sql_value(value));
        }
        (operator, value) => {
            out.push_str(&format!("{column_sql} {} ?", operator.as_sql()));
            params.push(to_sql_value(value));
        }
    }
}

fn push_has<M: Model>(
    relation_name: &str,
    comparison: &Comparison,
    out: &mut String,
    params: &mut Vec<SqlValue>,
) -> RepoResult<()> {
    let Some(def) = M::relation(relation_name) else {
        return Err(RepoError::UnknownRelation {
            table: M::TABLE,
            relation: relation_name.to_string(),
        });
    };
    let related = def.relation.related_table();
    if !def.relation.related_columns().contains(&comparison.column.as_str()) {
        return Err(RepoError::UnknownColumn {
            table: related,
            column: comparison.column.clone(),
        });
    }

    let subquery = match def.relation {
        Relation::BelongsTo {
            foreign_key,
            owner_key,
            ..
        } => format!(
            "SELECT 1 FROM {} WHERE {} = {}",
            quote(related),
            qualified(related, owner_key),
            qualified(M::TABLE, foreign_key)
        ),
        Relation::HasMany {
            foreign_key,
            local_key,
            ..
        } => format!(
            "SELECT 1 FROM {} WHERE {} = {}",
            quote(related),
            qualified(related, foreign_key),
            qualified(M::TABLE, local_key)
        ),
        Relation::BelongsToMany {
            pivot,
            foreign_pivot_key,
            related_pivot_key,
            local_key,
            related_key,
            ..
        } => format!(
            "SELECT 1 FROM {} INNER JOIN {} ON {} = {} WHERE {} = {}",
            quote(pivot),
            quote(related),
            qualified(related, related_key),
            qualified(pivot, related_pivot_key),
            qualified(pivot, foreign_pivot_key),
            qualified(M::TABLE, local_key)
        ),
    };

    out.push_str(&format!("EXISTS ({subquery} AND "));
    push_comparison(&qualified(related, &comparison.column), comparison, out, params);
    out.push(')');
    Ok(())
}

fn push_condition<M: Model>(
    condition: &Condition,
    out: &mut String,
    params: &mut Vec<SqlValue>,
) -> RepoResult<()> {
    match condition {
        Condition::Compare(comparison) => {
            let column = entity_column::<M>(&comparison.column)?;
            push_comparison(&column, comparison, out, params);
        }
        Condition::Any(group) if group.is_empty() => out.push_str("0 = 1"),
        Condition::Any(group) => {
            out.push('(');
            for (index, comparison) in group.iter().enumerate() {
                if index > 0 {
                    out.push_str(" OR ");
                }
                let column = entity_column::<M>(&comparison.column)?;
                push_comparison(&column, comparison, out, params);
            }
            out.push(')');
        }
        Condition::Has {
            relation,
            comparison,
        } => push_has::<M>(relation, comparison, out, params)?,
    }
    Ok(())
}

fn push_where<M: Model>(query: &Query<M>, stmt: &mut Statement) -> RepoResult<()> {
    for (index, condition) in query.conditions().iter().enumerate() {
        stmt.sql
            .push_str(if index == 0 { " WHERE " } else { " AND " });
        push_condition::<M>(condition, &mut stmt.sql, &mut stmt.params)?;
    }
    Ok(())
}

pub(crate) fn render_select<M: Model>(query: &Query<M>, columns: &Columns) -> RepoResult<Statement> {
    let mut stmt = Statement {
        sql: format!("SELECT {} FROM {}", select_list::<M>(columns)?, quote(M::TABLE)),
        params: Vec::new(),
    };
    push_where(query, &mut stmt)?;

    if !query.orders().is_empty() {
        let orders = query
            .orders()
            .iter()
            .map(|(column, direction)| {
                entity_column::<M>(column).map(|sql| format!("{sql} {}", direction.as_sql()))
            })
            .collect::<RepoResult<Vec<_>>>()?;
        stmt.sql.push_str(" ORDER BY ");
        stmt.sql.push_str(&orders.join(", "));
    }

    match (query.limit_value(), query.offset_value()) {
        (Some(limit), offset) => {
            stmt.sql.push_str(" LIMIT ?");
            stmt.params.push(SqlValue::Integer(i64::from(limit)));
            if let Some(offset) = offset.filter(|offset| *offset > 0) {
                stmt.sql.push_str(" OFFSET ?");
                stmt.params.push(SqlValue::Integer(i64::from(offset)));
            }
        }
        (None, Some(offset)) if offset > 0 => {
            stmt.sql.push_str(" LIMIT -1 OFFSET ?");
            stmt.params.push(SqlValue::Integer(i64::from(offset)));
        }
        (None, _) => {}
    }

    Ok(stmt)
}

pub(crate) fn render_count<M: Model>(query: &Query<M>) -> RepoResult<Statement> {
    let mut stmt = Statement {
        sql: format!("SELECT COUNT(*) AS aggregate FROM {}", quote(M::TABLE)),
        params: Vec::new(),
    };
    push_where(query, &mut stmt)?;
    Ok(stmt)
}

/// Renders `UPDATE` for the rows matched by `query`'s conditions.
pub(crate) fn render_update<M: Model>(
    query: &Query<M>,
    data: &Attributes,
) -> RepoResult<Statement> {
    let mut assignments = Vec::with_capacity(data.len() + 1);
    let mut params = Vec::with_capacity(data.len());
    for (column, value) in data {
        if column == M::PRIMARY_KEY {
            continue;
        }
        entity_column::<M>(column)?;
        assignments.push(format!("{} = ?", quote(column)));
        params.push(to_sql_value(value));
    }
    if M::TIMESTAMPS && M::has_column("updated_at") && !data.contains_key("updated_at") {
        assignments.push(format!(
            "{} = (strftime('%s', 'now') * 1000)",
            quote("updated_at")
        ));
    }

    let mut stmt = Statement {
        sql: format!("UPDATE {} SET {}", quote(M::TABLE), assignments.join(", ")),
        params,
    };
    push_where(query, &mut stmt)?;
    Ok(stmt)
}
