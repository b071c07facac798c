//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

use super::AuthenticatedUser;

/// List books. Without filters, returns all active books; with a filter,
/// returns the matching books regardless of active state.
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = [Book]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = if let Some(ref author) = query.author {
        state.services.books.list_books_by_author(author).await?
    } else if let Some(ref created_by) = query.created_by {
        state.services.books.list_books_by_creator(created_by).await?
    } else {
        state.services.books.list_active_books().await?
    };

    Ok(Json(books))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Duplicate book")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state
        .services
        .books
        .create_book(request, &claims.sub)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Get book details by ID, regardless of active state
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_book(id).await?;
    Ok(Json(book))
}

/// Update an existing book. Blank or absent fields keep their stored
/// values.
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Book is inactive"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Duplicate book")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    let updated = state
        .services
        .books
        .update_book(id, request, &claims.sub)
        .await?;

    Ok(Json(updated))
}

/// Soft-delete a book; the record is kept and can be restored
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book soft-deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.books.soft_delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted book
#[utoipa::path(
    post,
    path = "/books/{id}/restore",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book restored", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn restore_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.restore_book(id).await?;
    Ok(Json(book))
}

/// Get a book by barcode
#[utoipa::path(
    get,
    path = "/books/barcode/{barcode}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("barcode" = String, Path, description = "Book barcode")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_by_barcode(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(barcode): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_book_by_barcode(&barcode).await?;
    Ok(Json(book))
}
