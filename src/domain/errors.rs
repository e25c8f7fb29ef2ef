//! Domain error types
//!
//! Business-rule refusals (book not found, book unavailable, ...) are not
//! errors: they are variants of the per-operation outcome enums in
//! `circulation`. `DomainError` covers only unexpected store or
//! infrastructure failures.

use std::fmt;

#[derive(Debug)]
pub enum DomainError {
    /// Database/persistence error
    Database(String),
    /// Generic internal error
    Internal(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}
