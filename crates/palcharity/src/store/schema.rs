//! `SQLite` schema definitions for palcharity.
//!
//! Table names match the record store collections. Location columns on the
//! donation log are added by migration 2, not here.

/// SQL statement to create the donors table.
pub const CREATE_DONORS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS donors (
    uid TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL
)
";

/// SQL statement to create the associations table.
pub const CREATE_ASSOCIATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS associations (
    uid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL
)
";

/// SQL statement to create the projects table.
pub const CREATE_PROJECTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    amount_needed INTEGER NOT NULL CHECK (amount_needed > 0),
    amount_remaining INTEGER NOT NULL CHECK (amount_remaining >= 0),
    association_name TEXT NOT NULL,
    type TEXT NOT NULL,
    image_url TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the donation log.
pub const CREATE_DONATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS don_projet (
    id TEXT PRIMARY KEY,
    uid TEXT NOT NULL,
    project_id TEXT NOT NULL,
    donor_first_name TEXT NOT NULL,
    donor_last_name TEXT NOT NULL,
    type TEXT NOT NULL,
    amount INTEGER NOT NULL CHECK (amount >= 0),
    timestamp INTEGER NOT NULL,
    project_title TEXT NOT NULL,
    association_name TEXT NOT NULL
)
";

/// Index for per-donor scans of the donation log.
pub const CREATE_DONATION_DONOR_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_don_projet_uid ON don_projet(uid)
";

/// Index for per-project scans of the donation log.
pub const CREATE_DONATION_PROJECT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_don_projet_project ON don_projet(project_id)
";

/// Index for listing an association's projects.
pub const CREATE_PROJECT_ASSOCIATION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_projects_association ON projects(association_name)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DONORS_TABLE,
    CREATE_ASSOCIATIONS_TABLE,
    CREATE_PROJECTS_TABLE,
    CREATE_DONATIONS_TABLE,
    CREATE_DONATION_DONOR_INDEX,
    CREATE_DONATION_PROJECT_INDEX,
    CREATE_PROJECT_ASSOCIATION_INDEX,
    CREATE_METADATA_TABLE,
];
