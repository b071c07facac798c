//! Book catalog workflows

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{book_changes, Book, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a new book. Validation and duplicate checks all run before
    /// the insert; the unique indexes remain the authoritative guard.
    pub async fn create_book(&self, request: CreateBook, creator_email: &str) -> AppResult<Book> {
        request.validate()?;
        let record = request.into_record(creator_email)?;

        // Duplicate checks against any state, active or not
        if self
            .repository
            .books
            .find_by_name_author_genre(&record.name, &record.author, &record.genre)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A book with this name, author and genre already exists".to_string(),
            ));
        }

        if let Some(ref barcode) = record.barcode {
            if self.repository.books.find_by_barcode(barcode).await?.is_some() {
                return Err(AppError::Conflict(
                    "A book with this barcode already exists".to_string(),
                ));
            }
        }

        let book = self.repository.books.create(&record).await?;
        tracing::info!(book_id = %book.id, created_by = %book.created_by, "Book created");

        Ok(book)
    }

    /// Update an existing book. Incoming fields overlay the stored record;
    /// blank or absent fields keep their stored values.
    pub async fn update_book(
        &self,
        id: Uuid,
        request: UpdateBook,
        updater_email: &str,
    ) -> AppResult<Book> {
        request.validate()?;

        let current = self.repository.books.get_by_id(id).await?;
        if !current.is_active {
            return Err(AppError::Forbidden(
                "Inactive book must be restored before updating".to_string(),
            ));
        }

        let candidate = request.overlay_onto(&current);

        if let Some(other) = self
            .repository
            .books
            .find_by_name_author_genre(&candidate.name, &candidate.author, &candidate.genre)
            .await?
        {
            if other.id != id {
                return Err(AppError::Conflict(
                    "A book with this name, author and genre already exists".to_string(),
                ));
            }
        }

        if let Some(ref barcode) = candidate.barcode {
            if let Some(other) = self.repository.books.find_by_barcode(barcode).await? {
                if other.id != id {
                    return Err(AppError::Conflict(
                        "A book with this barcode already exists".to_string(),
                    ));
                }
            }
        }

        let changes = book_changes(&current, &candidate);
        if changes.is_empty() {
            return Ok(current);
        }

        self.repository.books.update(id, &changes, updater_email).await
    }

    /// Soft-delete a book. Idempotent; the record is kept for restore.
    pub async fn soft_delete_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await?;
        let book = self.repository.books.set_active(id, false).await?;
        tracing::info!(book_id = %book.id, "Book soft-deleted");

        Ok(book)
    }

    /// Restore a soft-deleted book. Idempotent.
    pub async fn restore_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await?;
        let book = self.repository.books.set_active(id, true).await?;
        tracing::info!(book_id = %book.id, "Book restored");

        Ok(book)
    }

    /// Get a book by id, regardless of active state
    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Get a book by barcode
    pub async fn get_book_by_barcode(&self, barcode: &str) -> AppResult<Book> {
        self.repository
            .books
            .find_by_barcode(barcode)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with barcode {} not found", barcode)))
    }

    /// List all active books
    pub async fn list_active_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list_active().await
    }

    /// List books by exact author match
    pub async fn list_books_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        self.repository.books.list_by_author(author).await
    }

    /// List books by creator email
    pub async fn list_books_by_creator(&self, email: &str) -> AppResult<Vec<Book>> {
        self.repository.books.list_by_creator(email).await
    }
}
