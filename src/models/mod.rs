//! Data models for Libris

pub mod book;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookChanges, NewBook};
pub use session::Session;
pub use user::{NewUser, User, UserChanges, UserClaims, UserPublic};
