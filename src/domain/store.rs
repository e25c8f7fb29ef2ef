//! Catalog/ledger access contract
//!
//! The circulation engine talks to persistence only through this trait.
//! Every method is scoped to a single tenant partition (one teacher's
//! catalog and roster), passed explicitly on each call - the engine never
//! resolves the partition from ambient state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::DomainError;

/// Tenant partition key. Selected by the caller from an identity token the
/// core receives but does not interpret.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TenantId(pub i32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    Available,
    Borrowed,
    Lost,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "AVAILABLE",
            BookStatus::Borrowed => "BORROWED",
            BookStatus::Lost => "LOST",
        }
    }

    /// Unknown values fall back to AVAILABLE rather than poisoning a read.
    pub fn parse(s: &str) -> Self {
        match s {
            "BORROWED" => BookStatus::Borrowed,
            "LOST" => BookStatus::Lost,
            _ => BookStatus::Available,
        }
    }
}

/// Book as seen by the circulation engine.
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub status: BookStatus,
}

/// Student as seen by the circulation engine.
#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub id: i32,
    pub name: String,
    pub student_number: String,
    pub grade: String,
    pub email: Option<String>,
    pub reading_history: Vec<i32>,
}

/// Input for appending a loan record to the ledger.
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub book_id: i32,
    pub student_id: i32,
    pub issue_date: String,
    pub due_date: String,
}

/// An open (not yet returned) ledger entry.
#[derive(Debug, Clone)]
pub struct OpenLoan {
    pub id: i32,
    pub book_id: i32,
    pub student_id: i32,
    pub issue_date: String,
    pub due_date: String,
}

/// Storage operations the circulation engine needs.
///
/// Implementations live in the infrastructure layer.
#[async_trait]
pub trait CirculationStore: Send + Sync {
    /// Resolve a book by its scan token (ISBN).
    async fn find_book_by_token(
        &self,
        tenant: TenantId,
        token: &str,
    ) -> Result<Option<BookRecord>, DomainError>;

    /// Resolve a student by their scan token (student number).
    async fn find_student_by_token(
        &self,
        tenant: TenantId,
        token: &str,
    ) -> Result<Option<StudentRecord>, DomainError>;

    /// Flip the book AVAILABLE -> BORROWED in a single conditional write.
    ///
    /// Returns false when the book was no longer AVAILABLE at write time.
    /// This is the one place where the probe-to-commit race between two
    /// concurrent issue calls is decided.
    async fn try_mark_book_borrowed(
        &self,
        tenant: TenantId,
        book_id: i32,
    ) -> Result<bool, DomainError>;

    /// Unconditional status write (used by returns and admin actions).
    async fn set_book_status(
        &self,
        tenant: TenantId,
        book_id: i32,
        status: BookStatus,
    ) -> Result<(), DomainError>;

    /// Append a loan record, open (`is_returned = false`). Returns its id.
    async fn create_transaction(
        &self,
        tenant: TenantId,
        loan: NewLoan,
    ) -> Result<i32, DomainError>;

    /// First open ledger entry for the book, if any.
    async fn find_open_transaction_for_book(
        &self,
        tenant: TenantId,
        book_id: i32,
    ) -> Result<Option<OpenLoan>, DomainError>;

    /// The single legal ledger mutation: `is_returned` false -> true.
    async fn mark_transaction_returned(
        &self,
        tenant: TenantId,
        transaction_id: i32,
        return_date: &str,
    ) -> Result<(), DomainError>;

    /// Append a book id to the student's reading history.
    async fn append_to_history(
        &self,
        tenant: TenantId,
        student_id: i32,
        book_id: i32,
    ) -> Result<(), DomainError>;

    /// Remove one occurrence of the book id from the student's history.
    /// Returns false when the student id does not resolve in this partition.
    async fn remove_from_history(
        &self,
        tenant: TenantId,
        student_id: i32,
        book_id: i32,
    ) -> Result<bool, DomainError>;
}
