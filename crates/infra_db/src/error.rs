//! Database error types
//!
//! SQLx errors are classified by PostgreSQL SQLSTATE so that adapters can
//! report duplicates and constraint failures as the matching `PortError`.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint or trigger rejection
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be mapped back to a domain type
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("CommissionRecord", "3f2a");
    /// assert!(error.to_string().contains("CommissionRecord"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    pub fn duplicate(entity: &str, field: &str, value: impl std::fmt::Display) -> Self {
        DatabaseError::DuplicateEntry(format!("{} with {} '{}' already exists", entity, field, value))
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        DatabaseError::CorruptRow(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted)
    }
}

/// Maps SQLx errors by PostgreSQL error code
///
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") | Some("23000") => DatabaseError::ConstraintViolation(message),
                    Some("40001") | Some("40P01") => DatabaseError::TransactionFailed(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::CorruptRow(error.to_string())
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "Record".to_string(),
                id: message,
            },
            DatabaseError::DuplicateEntry(message) => PortError::conflict(message),
            DatabaseError::ForeignKeyViolation(message) | DatabaseError::ConstraintViolation(message) => {
                PortError::validation(message)
            }
            e @ (DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted) => PortError::Connection {
                message: e.to_string(),
                source: Some(Box::new(e)),
            },
            e => PortError::Internal {
                message: e.to_string(),
                source: Some(Box::new(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_port_not_found() {
        let port: PortError = DatabaseError::not_found("LedgerEntry", "abc").into();
        assert!(port.is_not_found());
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let port: PortError = DatabaseError::duplicate("Policy", "policy_id", "p-1").into();
        assert!(matches!(port, PortError::Conflict { .. }));
    }

    #[test]
    fn test_connection_errors_are_transient() {
        let port: PortError = DatabaseError::PoolExhausted.into();
        assert!(port.is_transient());
        assert!(DatabaseError::ConnectionFailed("refused".into()).is_connection_error());
    }

    #[test]
    fn test_constraint_classification() {
        assert!(DatabaseError::ConstraintViolation("check".into()).is_constraint_violation());
        assert!(!DatabaseError::CorruptRow("bad".into()).is_constraint_violation());
    }

    #[test]
    fn test_row_not_found_from_sqlx() {
        let error: DatabaseError = sqlx::Error::RowNotFound.into();
        assert!(error.is_not_found());
    }
}
