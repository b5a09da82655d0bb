//! Error types for tagorm

use thiserror::Error;

/// Result type alias for tagorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Boxed error produced by an executor's underlying driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for mapping and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// The caller broke an API contract (empty column list, duplicate column,
    /// invalid identifier, update-by-key on a type without a key, a field
    /// value that cannot be encoded, ...).
    ///
    /// These are programming errors: retrying the same call cannot succeed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single-record fetch matched no rows
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error returned by the executor's driver, passed through unchanged
    #[error("Driver error: {0}")]
    Driver(#[source] DriverError),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A query hook refused to let the query run
    #[error("Query aborted by hook: {0}")]
    Aborted(String),

    /// A batch failed and rolling the transaction back failed as well
    #[error("{error} (rollback failed: {rollback})")]
    RollbackFailed {
        error: Box<OrmError>,
        rollback: Box<OrmError>,
    },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap a driver error without altering it
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a caller contract violation
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Borrow the driver error, if this error came from the executor
    pub fn as_driver_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Driver(err) => Some(err.as_ref()),
            Self::RollbackFailed { error, .. } => error.as_driver_error(),
            _ => None,
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for OrmError {
    fn from(err: rusqlite::Error) -> Self {
        Self::driver(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variants() {
        assert!(OrmError::not_found("users").is_not_found());
        assert!(!OrmError::not_found("users").is_invalid_argument());
        assert!(OrmError::invalid_argument("no columns").is_invalid_argument());
    }

    #[test]
    fn driver_error_is_kept_verbatim() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = OrmError::driver(io);
        let source = err.as_driver_error().expect("driver error");
        assert_eq!(source.to_string(), "reset by peer");
        assert_eq!(err.to_string(), "Driver error: reset by peer");
    }

    #[test]
    fn rollback_failure_mentions_both_errors() {
        let err = OrmError::RollbackFailed {
            error: Box::new(OrmError::Other("duplicate key".into())),
            rollback: Box::new(OrmError::Other("connection closed".into())),
        };
        assert_eq!(
            err.to_string(),
            "duplicate key (rollback failed: connection closed)"
        );
    }
}
