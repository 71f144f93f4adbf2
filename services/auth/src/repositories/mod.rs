//! Repositories for database operations

pub mod session;
pub mod user;

pub use session::SessionRepository;
pub use user::UserRepository;

use common::error::DatabaseError;

/// Whether a database error is a unique-constraint violation (Postgres 23505)
pub fn is_unique_violation(err: &DatabaseError) -> bool {
    if let DatabaseError::Query(sqlx::Error::Database(db_err)) = err {
        return db_err.code().as_deref() == Some("23505");
    }
    false
}
