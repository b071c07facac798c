//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, NewBook},
};

use super::map_unique_violation;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID, regardless of active state
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Exact-match lookup on the (name, author, genre) uniqueness triple,
    /// regardless of active state
    pub async fn find_by_name_author_genre(
        &self,
        name: &str,
        author: &str,
        genre: &str,
    ) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books WHERE name = $1 AND author = $2 AND genre = $3
            "#,
        )
        .bind(name)
        .bind(author)
        .bind(genre)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Exact-match barcode lookup, regardless of active state
    pub async fn find_by_barcode(&self, barcode: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE barcode = $1")
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// List all active books
    pub async fn list_active(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE is_active = TRUE ORDER BY name, author",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// List books by exact author match, regardless of active state
    pub async fn list_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        let books =
            sqlx::query_as::<_, Book>("SELECT * FROM books WHERE author = $1 ORDER BY name")
                .bind(author)
                .fetch_all(&self.pool)
                .await?;

        Ok(books)
    }

    /// List books by creator email, regardless of active state
    pub async fn list_by_creator(&self, email: &str) -> AppResult<Vec<Book>> {
        let books =
            sqlx::query_as::<_, Book>("SELECT * FROM books WHERE created_by = $1 ORDER BY name")
                .bind(email)
                .fetch_all(&self.pool)
                .await?;

        Ok(books)
    }

    /// Create a new book
    pub async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (name, summary, author, genre, barcode, created_by, last_updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(&book.name)
        .bind(&book.summary)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.barcode)
        .bind(&book.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Book already exists"))?;

        Ok(created)
    }

    /// Apply a partial-field update. Only the fields present in `changes`
    /// are written; the audit pair is always stamped.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &BookChanges,
        updated_by: &str,
    ) -> AppResult<Book> {
        let now = Utc::now();

        // Build dynamic update query
        let mut sets = vec![
            "last_updated_at = $1".to_string(),
            "last_updated_by = $2".to_string(),
        ];
        let mut param_idx = 3;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(changes.name, "name");
        add_field!(changes.summary, "summary");
        add_field!(changes.author, "author");
        add_field!(changes.genre, "genre");
        add_field!(changes.barcode, "barcode");

        let query = format!(
            "UPDATE books SET {} WHERE id = ${}",
            sets.join(", "),
            param_idx
        );

        let mut builder = sqlx::query(&query).bind(now).bind(updated_by);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.name);
        bind_field!(changes.summary);
        bind_field!(changes.author);
        bind_field!(changes.genre);
        bind_field!(changes.barcode);

        builder
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Book already exists"))?;

        self.get_by_id(id).await
    }

    /// Flip the active flag. Idempotent; stamps last_updated_at only.
    pub async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Book> {
        let now = Utc::now();

        sqlx::query("UPDATE books SET is_active = $1, last_updated_at = $2 WHERE id = $3")
            .bind(active)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_by_id(id).await
    }
}
