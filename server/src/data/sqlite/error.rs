//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataError;

    #[test]
    fn test_migration_failure_carries_into_data_error() {
        let err = SqliteError::MigrationFailed {
            version: 1,
            name: "initial_schema".to_string(),
            error: "table exists".to_string(),
        };
        assert!(matches!(
            DataError::from(err),
            DataError::MigrationFailed { version: 1, .. }
        ));
    }

    #[test]
    fn test_database_error_is_classified() {
        let err = SqliteError::from(sqlx::Error::PoolClosed);
        assert!(matches!(DataError::from(err), DataError::Connection(_)));
    }
}
