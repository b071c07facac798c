//! Repository layer for database operations

pub mod books;
pub mod sessions;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::error::AppError;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub sessions: sessions::SessionsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            sessions: sessions::SessionsRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Map a unique-index violation to a Conflict with the given message.
/// The index is the authoritative duplicate check; service-level lookups
/// only provide friendlier early errors.
pub(crate) fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
