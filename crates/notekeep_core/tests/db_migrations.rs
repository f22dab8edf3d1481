use notekeep_core::db::migrations::latest_version;
use notekeep_core::db::{open_db, open_db_in_memory, DbError};
use notekeep_core::storage::{KvStore, SqliteKvStore, StorageError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn reopening_file_keeps_schema_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notekeep.db");

    let mut first = SqliteKvStore::open(&path).unwrap();
    first.set("alpha", "1").unwrap();
    first.set("alpha", "2").unwrap();
    drop(first);

    let second = SqliteKvStore::open(&path).unwrap();
    assert_eq!(second.get("alpha").unwrap().as_deref(), Some("2"));
    assert_eq!(second.get("missing").unwrap(), None);
    assert_eq!(second.keys().unwrap(), vec!["alpha".to_string()]);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        SqliteKvStore::open(&path),
        Err(StorageError::Db(DbError::UnsupportedSchemaVersion { .. }))
    ));
}

#[test]
fn from_connection_migrates_fresh_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let mut kv = SqliteKvStore::from_connection(conn).unwrap();
    kv.set("k", "v").unwrap();
    assert_eq!(kv.get("k").unwrap().as_deref(), Some("v"));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table `{table_name}` should exist");
}
