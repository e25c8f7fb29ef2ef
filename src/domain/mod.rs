//! Domain layer - framework-agnostic circulation logic
//!
//! This module contains the business types and contracts of the circulation
//! core. No HTTP or database types leak in here; the storage backend is
//! reached only through the `CirculationStore` trait.

pub mod circulation;
pub mod errors;
pub mod store;

pub use circulation::{
    BatchReport, CirculationMode, HistoryOutcome, IssueOutcome, ReturnOutcome, Verdict,
};
pub use errors::DomainError;
pub use store::{
    BookRecord, BookStatus, CirculationStore, NewLoan, OpenLoan, StudentRecord, TenantId,
};
