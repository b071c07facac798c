//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Maximum length of a book name
pub const BOOK_NAME_MAX_LENGTH: usize = 255;

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub name: String,
    /// Free-form, possibly multi-line summary
    pub summary: Option<String>,
    pub author: String,
    pub genre: String,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Email of the creating user
    pub created_by: String,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_updated_by: Option<String>,
    pub is_active: bool,
}

/// Persistable shell for a new book, produced by request conversion
#[derive(Debug, Clone)]
pub struct NewBook {
    pub name: String,
    pub summary: Option<String>,
    pub author: String,
    pub genre: String,
    pub barcode: Option<String>,
    pub created_by: String,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    pub summary: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be blank"))]
    pub author: String,
    #[validate(length(min = 1, message = "Genre cannot be blank"))]
    pub genre: String,
    pub barcode: Option<String>,
}

impl CreateBook {
    /// Convert the request into a persistable shell, rejecting blank or
    /// oversized required fields. Whitespace-only optional fields are
    /// normalized to absent.
    pub fn into_record(self, creator_email: &str) -> AppResult<NewBook> {
        let name = trimmed_required(&self.name, "name")?;
        if name.chars().count() > BOOK_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "Book name cannot exceed {} characters",
                BOOK_NAME_MAX_LENGTH
            )));
        }
        let author = trimmed_required(&self.author, "author")?;
        let genre = trimmed_required(&self.genre, "genre")?;

        Ok(NewBook {
            name,
            summary: self.summary.filter(|s| !s.trim().is_empty()),
            author,
            genre,
            barcode: normalize_barcode(self.barcode.as_deref()),
            created_by: creator_email.to_string(),
        })
    }
}

/// Update book request; absent or blank fields keep their stored values
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub barcode: Option<String>,
}

impl UpdateBook {
    /// Build the candidate merged record: each incoming field replaces the
    /// stored value only when present and non-empty after trimming,
    /// otherwise the stored value is retained.
    pub fn overlay_onto(&self, current: &Book) -> Book {
        let mut candidate = current.clone();
        candidate.name = overlay_field(&current.name, self.name.as_deref());
        candidate.author = overlay_field(&current.author, self.author.as_deref());
        candidate.genre = overlay_field(&current.genre, self.genre.as_deref());
        candidate.barcode =
            overlay_opt_field(current.barcode.as_deref(), self.barcode.as_deref());
        // Summary keeps interior whitespace verbatim; only blankness is tested
        candidate.summary = match self.summary.as_deref() {
            Some(v) if !v.trim().is_empty() => Some(v.to_string()),
            _ => current.summary.clone(),
        };
        candidate
    }
}

/// Partial-field diff applied by the persistence gateway
#[derive(Debug, Default, Clone)]
pub struct BookChanges {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub barcode: Option<String>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.summary.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.barcode.is_none()
    }
}

/// Compute the fields that actually changed between the stored book and the
/// overlaid candidate.
pub fn book_changes(current: &Book, candidate: &Book) -> BookChanges {
    BookChanges {
        name: diff_field(&current.name, &candidate.name),
        summary: diff_opt_field(current.summary.as_deref(), candidate.summary.as_deref()),
        author: diff_field(&current.author, &candidate.author),
        genre: diff_field(&current.genre, &candidate.genre),
        barcode: diff_opt_field(current.barcode.as_deref(), candidate.barcode.as_deref()),
    }
}

/// Book list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Exact author match
    pub author: Option<String>,
    /// Exact creator-email match
    pub created_by: Option<String>,
}

fn trimmed_required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("Book {} cannot be blank", field)));
    }
    Ok(trimmed.to_string())
}

fn normalize_barcode(barcode: Option<&str>) -> Option<String> {
    barcode
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(String::from)
}

fn overlay_field(current: &str, incoming: Option<&str>) -> String {
    match incoming.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => current.to_string(),
    }
}

fn overlay_opt_field(current: Option<&str>, incoming: Option<&str>) -> Option<String> {
    match incoming.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => current.map(String::from),
    }
}

fn diff_field(current: &str, candidate: &str) -> Option<String> {
    (candidate != current).then(|| candidate.to_string())
}

fn diff_opt_field(current: Option<&str>, candidate: Option<&str>) -> Option<String> {
    if candidate != current {
        candidate.map(String::from)
    } else {
        None
    }
}
