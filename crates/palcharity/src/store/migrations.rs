//! Schema versioning for the `SQLite` record store.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, then runs any
/// pending migrations to bring the schema up to the current version. All of
/// it happens in one immediate transaction: a failed migration leaves the
/// database at its previous version, and two processes opening the same
/// file never migrate it twice.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    for statement in SCHEMA_STATEMENTS {
        tx.execute(statement, [])?;
    }

    let version = get_schema_version(&tx)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported \
                 version {CURRENT_VERSION}"
            ),
        });
    }
    if version < CURRENT_VERSION {
        run_migrations(&tx, version)?;
    }

    tx.commit()?;
    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh database).
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Run migrations from the given version to the current version.
fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    let mut current = from_version;

    while current < CURRENT_VERSION {
        current += 1;
        run_migration(conn, current)?;
    }

    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Run a specific migration version.
fn run_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

/// Version 1 is the base schema created by `SCHEMA_STATEMENTS`.
fn migrate_v1(conn: &Connection) -> Result<()> {
    set_schema_version(conn, 1)?;
    Ok(())
}

/// Version 2 adds the optional donor location to the donation log.
///
/// Columns already present are skipped, so a file touched by an older,
/// non-transactional upgrade still reaches version 2.
fn migrate_v2(conn: &Connection) -> Result<()> {
    let existing = column_names(conn, "don_projet")?;
    for column in ["lat", "lng"] {
        if existing.iter().any(|c| c == column) {
            continue;
        }
        conn.execute(&format!("ALTER TABLE don_projet ADD COLUMN {column} REAL"), [])
            .map_err(|e| Error::DatabaseMigration {
                message: format!("adding location column {column}: {e}"),
            })?;
    }
    set_schema_version(conn, 2)?;
    Ok(())
}

/// Column names of a table, in declaration order.
fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    fn table_exists(conn: &Connection, name: &str) -> bool {
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_initialize_schema_creates_tables() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("failed to initialize schema");

        for table in ["donors", "associations", "projects", "don_projet", "metadata"] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_initialize_schema_sets_version() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("failed to initialize schema");

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_initialize_schema_idempotent() {
        let conn = create_test_db();

        initialize_schema(&conn).expect("first init failed");
        initialize_schema(&conn).expect("second init failed");

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_v2_adds_location_columns() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        let columns = column_names(&conn, "don_projet").unwrap();
        assert!(columns.iter().any(|c| c == "lat"));
        assert!(columns.iter().any(|c| c == "lng"));
    }

    #[test]
    fn test_upgrade_from_v1_database() {
        let conn = v1_database();
        conn.execute(
            "INSERT INTO don_projet (id, uid, project_id, donor_first_name, donor_last_name,
                type, amount, timestamp, project_title, association_name)
             VALUES ('d1', 'u1', 'p1', 'A', 'B', 'money', 10, 0, 'T', 'Asso')",
            [],
        )
        .unwrap();

        initialize_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 2);
        let lat: Option<f64> = conn
            .query_row("SELECT lat FROM don_projet WHERE id = 'd1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(lat.is_none());
    }

    fn v1_database() -> Connection {
        let conn = create_test_db();
        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, []).unwrap();
        }
        set_schema_version(&conn, 1).unwrap();
        conn
    }

    #[test]
    fn test_half_applied_v2_is_repaired() {
        let conn = v1_database();
        conn.execute("ALTER TABLE don_projet ADD COLUMN lat REAL", []).unwrap();

        initialize_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 2);
        let columns = column_names(&conn, "don_projet").unwrap();
        assert_eq!(columns.iter().filter(|c| *c == "lat").count(), 1);
        assert!(columns.iter().any(|c| c == "lng"));
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let conn = v1_database();
        conn.execute_batch(
            "CREATE TRIGGER refuse_v2 BEFORE INSERT ON metadata WHEN NEW.value = '2'
             BEGIN SELECT RAISE(ABORT, 'refused'); END;",
        )
        .unwrap();

        assert!(initialize_schema(&conn).is_err());
        assert!(conn.is_autocommit());
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
        let columns = column_names(&conn, "don_projet").unwrap();
        assert!(!columns.iter().any(|c| c == "lat" || c == "lng"));

        conn.execute_batch("DROP TRIGGER refuse_v2").unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();
        set_schema_version(&conn, CURRENT_VERSION + 1).unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_get_schema_version_fresh_db() {
        let conn = create_test_db();
        conn.execute(
            "CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_invalid_schema_version_value() {
        let conn = create_test_db();
        conn.execute(
            "CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('schema_version', 'two')",
            [],
        )
        .unwrap();

        let err = get_schema_version(&conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_run_migration_unknown_version() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        let err = run_migration(&conn, 999).unwrap_err();
        assert!(err.to_string().contains("unknown migration version"));
    }

    #[test]
    fn test_indexes_created() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("failed to initialize schema");

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='don_projet'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .collect();

        assert!(indexes.iter().any(|n| n.contains("uid")));
        assert!(indexes.iter().any(|n| n.contains("project")));
    }
}
