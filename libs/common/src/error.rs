//! Shared database error types
//!
//! Repositories in both services wrap sqlx failures in `DatabaseError` so
//! handlers can translate any storage problem into one generic internal
//! response at the boundary; the underlying cause is only logged.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Error raised by pool construction, queries, or migrations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The connection pool could not be established
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// A query failed to execute
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Applying migrations failed
    #[error("Database migration error: {0}")]
    Migration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
