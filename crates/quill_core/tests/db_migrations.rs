use quill_core::db::migrations::{latest_version, schema_version};
use quill_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    for table in ["users", "posts", "tags", "post_tag", "settings", "works"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute("INSERT INTO post_tag (post_id, tag_id) VALUES (41, 42);", [])
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn reopening_a_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quill.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO settings (setting_name, setting_value) VALUES ('site_title', 'Quill');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second).unwrap(), latest_version());
    let title: String = second
        .query_row(
            "SELECT setting_value FROM settings WHERE setting_name = 'site_title';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(title, "Quill");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(err.is_schema_too_new());
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_upgrade_names_the_step_and_keeps_the_old_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE posts (legacy TEXT);").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(!err.is_schema_too_new());
    match &err {
        DbError::Migration { version, name, .. } => {
            assert_eq!(*version, 1);
            assert_eq!(*name, "init");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("v1 (init)"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), 0);
    let users: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(users, 0, "rolled back upgrade must not leave tables behind");
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
