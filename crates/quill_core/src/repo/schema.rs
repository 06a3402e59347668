//! Construction-time checks of an entity declaration against the schema.

use crate::model::entity::Model;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::Connection;

/// Fails unless `M`'s table, columns and relation tables all exist.
pub(crate) fn ensure_model_ready<M: Model>(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, M::TABLE)? {
        return Err(RepoError::MissingRequiredTable(M::TABLE));
    }

    let existing = table_columns(conn, M::TABLE)?;
    for &column in M::COLUMNS {
        if !existing.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: M::TABLE,
                column,
            });
        }
    }
    if !M::has_column(M::PRIMARY_KEY) {
        return Err(RepoError::Configuration(format!(
            "`{}` does not list its primary key `{}` among its columns",
            M::TABLE,
            M::PRIMARY_KEY
        )));
    }

    for def in M::RELATIONS {
        for table in def.relation.required_tables() {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let mut rows = stmt.query([table])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(0)?);
    }
    Ok(columns)
}
