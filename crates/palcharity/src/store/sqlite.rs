//! `SQLite`-backed record store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{migrations, new_record_id, RecordStore};
use crate::error::{Error, Result};
use crate::model::{
    Association, AssociationUpdate, Category, Donation, Donor, DonorUpdate, GeoPoint, NewProject,
    Project,
};

const PROJECT_COLUMNS: &str = "id, title, description, amount_needed, amount_remaining, \
                               association_name, type, image_url";

const DONATION_COLUMNS: &str = "id, uid, project_id, donor_first_name, donor_last_name, type, \
                                amount, timestamp, project_title, association_name, lat, lng";

/// Persistent record store on a local `SQLite` database.
///
/// A single connection is shared behind a mutex. Balance updates are single
/// `UPDATE ... RETURNING` statements, so they stay atomic even when several
/// processes open the same file. Async methods run their queries on the
/// blocking thread pool, so a busy database never stalls the runtime.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get record counts and file size.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let (donors, associations, projects, donations) = with_conn(&self.conn, |conn| {
            let count = |table: &str| -> Result<i64> {
                let sql = format!("SELECT COUNT(*) FROM {table}");
                Ok(conn.query_row(&sql, [], |row| row.get(0))?)
            };
            Ok((
                count("donors")?,
                count("associations")?,
                count("projects")?,
                count("don_projet")?,
            ))
        })?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            donors,
            associations,
            projects,
            donations,
            db_size_bytes,
        })
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || with_conn(&conn, f))
            .await
            .map_err(|e| Error::internal(format!("database task failed: {e}")))?
    }

    fn row_to_donor(row: &Row) -> rusqlite::Result<Donor> {
        Ok(Donor {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
        })
    }

    fn row_to_association(row: &Row) -> rusqlite::Result<Association> {
        Ok(Association {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
        })
    }

    fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
        Ok(Project {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            amount_needed: row.get(3)?,
            amount_remaining: row.get(4)?,
            association_name: row.get(5)?,
            category: category_column(row, 6)?,
            image_url: row.get(7)?,
        })
    }

    fn row_to_donation(row: &Row) -> rusqlite::Result<Donation> {
        let lat: Option<f64> = row.get(10)?;
        let lng: Option<f64> = row.get(11)?;

        Ok(Donation {
            id: Some(row.get(0)?),
            donor_id: row.get(1)?,
            project_id: row.get(2)?,
            donor_first_name: row.get(3)?,
            donor_last_name: row.get(4)?,
            category: category_column(row, 5)?,
            amount: row.get(6)?,
            timestamp: row.get(7)?,
            project_title: row.get(8)?,
            association_name: row.get(9)?,
            location: lat.zip(lng).map(|(lat, lng)| GeoPoint { lat, lng }),
        })
    }
}

fn with_conn<T>(conn: &Mutex<Connection>, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    let conn = conn
        .lock()
        .map_err(|e| Error::internal(format!("database lock poisoned: {e}")))?;
    f(&conn)
}

fn category_column(row: &Row, idx: usize) -> rusqlite::Result<Category> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown category '{raw}'").into(),
        )
    })
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn put_donor(&self, donor: &Donor) -> Result<()> {
        let donor = donor.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO donors (uid, first_name, last_name, email)
                 VALUES (?1, ?2, ?3, ?4)",
                params![donor.id, donor.first_name, donor.last_name, donor.email],
            )?;
            debug!("Wrote donor {}", donor.id);
            Ok(())
        })
        .await
    }

    async fn get_donor(&self, id: &str) -> Result<Option<Donor>> {
        let id = id.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT uid, first_name, last_name, email FROM donors WHERE uid = ?1",
                    [id],
                    Self::row_to_donor,
                )
                .optional()?)
        })
        .await
    }

    async fn update_donor(&self, id: &str, update: &DonorUpdate) -> Result<bool> {
        let id = id.to_string();
        let update = update.clone();
        self.run(move |conn| {
            let affected = conn.execute(
                "UPDATE donors SET
                    first_name = COALESCE(?2, first_name),
                    last_name = COALESCE(?3, last_name),
                    email = COALESCE(?4, email)
                 WHERE uid = ?1",
                params![id, update.first_name, update.last_name, update.email],
            )?;
            Ok(affected > 0)
        })
        .await
    }

    async fn put_association(&self, association: &Association) -> Result<()> {
        let association = association.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO associations (uid, name, email) VALUES (?1, ?2, ?3)",
                params![association.id, association.name, association.email],
            )?;
            debug!("Wrote association {}", association.id);
            Ok(())
        })
        .await
    }

    async fn get_association(&self, id: &str) -> Result<Option<Association>> {
        let id = id.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT uid, name, email FROM associations WHERE uid = ?1",
                    [id],
                    Self::row_to_association,
                )
                .optional()?)
        })
        .await
    }

    async fn update_association(&self, id: &str, update: &AssociationUpdate) -> Result<bool> {
        let id = id.to_string();
        let update = update.clone();
        self.run(move |conn| {
            let affected = conn.execute(
                "UPDATE associations SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email)
                 WHERE uid = ?1",
                params![id, update.name, update.email],
            )?;
            Ok(affected > 0)
        })
        .await
    }

    async fn insert_project(&self, project: &NewProject, image_url: &str) -> Result<Project> {
        let stored = Project {
            id: new_record_id(),
            title: project.title.clone(),
            description: project.description.clone(),
            amount_needed: project.amount_needed,
            amount_remaining: project.amount_needed,
            association_name: project.association_name.clone(),
            category: project.category,
            image_url: image_url.to_string(),
        };

        let row = stored.clone();
        self.run(move |conn| {
            let sql = format!(
                "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            );
            conn.execute(
                &sql,
                params![
                    row.id,
                    row.title,
                    row.description,
                    row.amount_needed,
                    row.amount_remaining,
                    row.association_name,
                    row.category.as_str(),
                    row.image_url,
                ],
            )?;
            Ok(())
        })
        .await?;

        debug!("Inserted project {}", stored.id);
        Ok(stored)
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let id = id.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                    [id],
                    Self::row_to_project,
                )
                .optional()?)
        })
        .await
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY rowid"))?;
            let projects = stmt
                .query_map([], Self::row_to_project)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(projects)
        })
        .await
    }

    async fn delete_project(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.run(move |conn| {
            let affected = conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
        .await
    }

    async fn decrement_remaining(&self, project_id: &str, amount: u32) -> Result<Option<u32>> {
        let project_id = project_id.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "UPDATE projects
                     SET amount_remaining = MAX(0, amount_remaining - ?2)
                     WHERE id = ?1
                     RETURNING amount_remaining",
                    params![project_id, amount],
                    |row| row.get(0),
                )
                .optional()?)
        })
        .await
    }

    async fn append_donation(&self, donation: &Donation) -> Result<String> {
        let id = new_record_id();
        let row_id = id.clone();
        let donation = donation.clone();
        let (lat, lng) = donation
            .location
            .map_or((None, None), |p| (Some(p.lat), Some(p.lng)));

        let project_id = donation.project_id.clone();
        self.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO don_projet ({DONATION_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    row_id,
                    donation.donor_id,
                    donation.project_id,
                    donation.donor_first_name,
                    donation.donor_last_name,
                    donation.category.as_str(),
                    donation.amount,
                    donation.timestamp,
                    donation.project_title,
                    donation.association_name,
                    lat,
                    lng,
                ],
            )?;
            Ok(())
        })
        .await?;

        debug!("Appended donation {} to project {}", id, project_id);
        Ok(id)
    }

    async fn donations(&self) -> Result<Vec<Donation>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DONATION_COLUMNS} FROM don_projet ORDER BY rowid"
            ))?;
            let donations = stmt
                .query_map([], Self::row_to_donation)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(donations)
        })
        .await
    }
}

/// Record counts for a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Donor profiles.
    pub donors: i64,
    /// Association profiles.
    pub associations: i64,
    /// Projects, funded or not.
    pub projects: i64,
    /// Entries in the donation log.
    pub donations: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
