//! Error types for palcharity.
//!
//! Every fallible operation in the crate returns [`Error`]. Variants are grouped
//! by the three failure families the ledger distinguishes: record store
//! failures, validation failures raised before any write, and not-found
//! conditions.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for palcharity operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Store Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A non-`SQLite` record store could not complete a read or write.
    ///
    /// `SqliteStore` reports its failures as [`Error::DatabaseQuery`]; this
    /// variant is for [`RecordStore`](crate::store::RecordStore) backends that
    /// have no `rusqlite` error to carry.
    #[error("record store unavailable: {0}")]
    Store(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Validation Errors ===
    /// Caller input was rejected before anything was written.
    #[error("invalid {field}: {message}")]
    Validation {
        /// The offending input field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    // === Not Found ===
    /// A donor or association profile does not exist.
    #[error("{kind} profile not found: {id}")]
    ProfileNotFound {
        /// Which directory was searched (`donor` or `association`).
        kind: &'static str,
        /// The account identifier.
        id: String,
    },

    /// A project does not exist.
    #[error("project not found: {id}")]
    ProjectNotFound {
        /// The project identifier.
        id: String,
    },

    // === Ledger Errors ===
    /// The donation was appended but the project balance was not updated.
    #[error("donation {donation_id} recorded but project balance was not reconciled: {source}")]
    Reconciliation {
        /// Identifier of the donation that is already in the log.
        donation_id: String,
        /// The failure raised by the reconciler.
        #[source]
        source: Box<Error>,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for palcharity operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new record store error.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a validation error for the given field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a profile not-found error.
    #[must_use]
    pub fn profile_not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::ProfileNotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a project not-found error.
    #[must_use]
    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::ProjectNotFound { id: id.into() }
    }

    /// Check if this error is a not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound { .. } | Self::ProjectNotFound { .. }
        )
    }

    /// Check if this error was raised by input validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from the record store.
    #[must_use]
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Store(_)
                | Self::DatabaseQuery(_)
                | Self::DatabaseOpen { .. }
                | Self::DatabaseMigration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::store("connection reset");
        assert_eq!(
            err.to_string(),
            "record store unavailable: connection reset"
        );

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_validation_error() {
        let err = Error::validation("amount", "must be a positive integer");
        assert!(err.is_validation());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "invalid amount: must be a positive integer");
    }

    #[test]
    fn test_profile_not_found() {
        let err = Error::profile_not_found("donor", "u-42");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "donor profile not found: u-42");
    }

    #[test]
    fn test_project_not_found() {
        let err = Error::project_not_found("p-1");
        assert!(err.is_not_found());
        assert!(!err.is_store_failure());
        assert!(err.to_string().contains("p-1"));
    }

    #[test]
    fn test_reconciliation_error_keeps_donation_id() {
        let err = Error::Reconciliation {
            donation_id: "d-7".to_string(),
            source: Box::new(Error::store("write rejected")),
        };
        let msg = err.to_string();
        assert!(msg.contains("d-7"));
        assert!(msg.contains("write rejected"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_store_failure_predicate() {
        assert!(Error::store("down").is_store_failure());
        assert!(Error::DatabaseMigration {
            message: "bad".to_string()
        }
        .is_store_failure());
        assert!(!Error::validation("email", "blank").is_store_failure());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_store_failure());
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "busy_timeout_ms must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("busy_timeout_ms"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
