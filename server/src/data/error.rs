//! Error type for the persistence store
//!
//! Every store operation fails with one of three categories: the store
//! could not be reached, a constraint rejected the write, or the statement
//! itself failed. Callers branch on the category, never on backend details.

use thiserror::Error;

use sqlx::error::ErrorKind;

/// Store error, classified by cause
#[derive(Error, Debug)]
pub enum DataError {
    /// Pool exhausted or closed, I/O failure, or worker crash
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// Unique, foreign key, not-null or check constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Statement failed for any other reason
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed at startup
    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    /// Filesystem error while provisioning the store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// True when retrying later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<sqlx::Error> for DataError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => Self::Connection(e.to_string()),
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => Self::ConstraintViolation(db.message().to_string()),
                _ => Self::Query(e.to_string()),
            },
            _ => Self::Query(e.to_string()),
        }
    }
}

impl From<crate::data::sqlite::SqliteError> for DataError {
    fn from(e: crate::data::sqlite::SqliteError) -> Self {
        match e {
            crate::data::sqlite::SqliteError::Database(e) => e.into(),
            crate::data::sqlite::SqliteError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                version,
                name,
                error,
            },
            crate::data::sqlite::SqliteError::Io(e) => Self::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_connection_failures() {
        assert!(matches!(
            DataError::from(sqlx::Error::PoolTimedOut),
            DataError::Connection(_)
        ));
        assert!(matches!(
            DataError::from(sqlx::Error::PoolClosed),
            DataError::Connection(_)
        ));
        assert!(DataError::from(sqlx::Error::PoolTimedOut).is_transient());
    }

    #[test]
    fn test_row_not_found_is_query_failure() {
        let err = DataError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DataError::Query(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_constraint_violation_classified() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, v REAL NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (id, v) VALUES (1, 1.0)")
            .execute(&pool)
            .await
            .unwrap();

        let duplicate = sqlx::query("INSERT INTO t (id, v) VALUES (1, 2.0)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(
            DataError::from(duplicate),
            DataError::ConstraintViolation(_)
        ));

        let missing = sqlx::query("INSERT INTO t (id, v) VALUES (2, NULL)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(
            DataError::from(missing),
            DataError::ConstraintViolation(_)
        ));
    }

    #[tokio::test]
    async fn test_bad_statement_is_query_failure() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let err = sqlx::query("SELECT * FROM no_such_table")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(DataError::from(err), DataError::Query(_)));
    }

    #[test]
    fn test_migration_failed_display() {
        let err = DataError::MigrationFailed {
            version: 1,
            name: "initial_schema".to_string(),
            error: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 1 (initial_schema) failed: syntax error"
        );
    }
}
