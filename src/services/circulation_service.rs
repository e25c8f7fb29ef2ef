//! Circulation Engine - Pure decision logic without HTTP layer
//!
//! Decides and executes the effects of one issue, one return, or one
//! pre-flight validation against the catalog and the transaction ledger,
//! for a single tenant per call. The engine holds no cache of book or
//! student state: every decision re-reads through the store.

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::domain::{
    BatchReport, BookStatus, CirculationMode, CirculationStore, DomainError, HistoryOutcome,
    IssueOutcome, NewLoan, ReturnOutcome, TenantId, Verdict,
};

pub struct CirculationEngine {
    store: Arc<dyn CirculationStore>,
}

impl CirculationEngine {
    pub fn new(store: Arc<dyn CirculationStore>) -> Self {
        Self { store }
    }

    /// Issue a book to a student.
    ///
    /// Precondition failures come back in this order: book lookup, student
    /// lookup, availability. The availability decision itself is the store's
    /// conditional write, so a stale read cannot double-issue the book.
    /// `loan_duration_days` has no upper bound here; the unsigned type rules
    /// out non-positive values.
    pub async fn issue_book(
        &self,
        tenant: TenantId,
        book_token: &str,
        student_token: &str,
        loan_duration_days: u32,
    ) -> Result<IssueOutcome, DomainError> {
        let Some(book) = self.store.find_book_by_token(tenant, book_token).await? else {
            return Ok(IssueOutcome::BookNotFound);
        };

        let Some(student) = self.store.find_student_by_token(tenant, student_token).await? else {
            return Ok(IssueOutcome::StudentNotFound);
        };

        // Fast refusal on the read, then the conditional write decides.
        if book.status != BookStatus::Available {
            return Ok(IssueOutcome::BookUnavailable);
        }
        if !self.store.try_mark_book_borrowed(tenant, book.id).await? {
            return Ok(IssueOutcome::BookUnavailable);
        }

        let warning = student.reading_history.contains(&book.id).then(|| {
            format!(
                "Dikkat! {} isimli öğrenci \"{}\" kitabını daha önce okumuş.",
                student.name, book.title
            )
        });

        let now = Utc::now();
        let loan = NewLoan {
            book_id: book.id,
            student_id: student.id,
            issue_date: now.to_rfc3339(),
            due_date: (now + Duration::days(i64::from(loan_duration_days))).to_rfc3339(),
        };

        let transaction_id = self.store.create_transaction(tenant, loan).await?;
        self.store
            .append_to_history(tenant, student.id, book.id)
            .await?;

        tracing::info!(
            book = %book.isbn,
            student = %student.student_number,
            transaction_id,
            "book issued"
        );

        Ok(IssueOutcome::Issued {
            transaction_id,
            warning,
        })
    }

    /// Return a book to inventory, closing its open transaction.
    pub async fn return_book(
        &self,
        tenant: TenantId,
        book_token: &str,
    ) -> Result<ReturnOutcome, DomainError> {
        let Some(book) = self.store.find_book_by_token(tenant, book_token).await? else {
            return Ok(ReturnOutcome::BookNotFound);
        };

        let Some(open) = self
            .store
            .find_open_transaction_for_book(tenant, book.id)
            .await?
        else {
            return Ok(ReturnOutcome::NoActiveLoan);
        };

        let now = Utc::now().to_rfc3339();
        self.store
            .mark_transaction_returned(tenant, open.id, &now)
            .await?;
        self.store
            .set_book_status(tenant, book.id, BookStatus::Available)
            .await?;

        tracing::info!(book = %book.isbn, transaction_id = open.id, "book returned");

        Ok(ReturnOutcome::Returned {
            transaction_id: open.id,
        })
    }

    /// Read-only probe used for live feedback while scanning. Mutates
    /// nothing; the verdict may go stale before the commit.
    pub async fn check_book_for_student(
        &self,
        tenant: TenantId,
        book_token: &str,
        student_token: Option<&str>,
    ) -> Result<Verdict, DomainError> {
        let Some(book) = self.store.find_book_by_token(tenant, book_token).await? else {
            return Ok(Verdict::NotFound);
        };

        if book.status != BookStatus::Available {
            return Ok(Verdict::NotAvailable);
        }

        if let Some(token) = student_token {
            if let Some(student) = self.store.find_student_by_token(tenant, token).await? {
                if student.reading_history.contains(&book.id) {
                    return Ok(Verdict::AlreadyRead);
                }
            }
        }

        Ok(Verdict::Valid)
    }

    /// Administrative correction: drop one occurrence of the book from the
    /// student's history. Transactions and book status are untouched.
    pub async fn remove_book_from_history(
        &self,
        tenant: TenantId,
        student_id: i32,
        book_id: i32,
    ) -> Result<HistoryOutcome, DomainError> {
        if self
            .store
            .remove_from_history(tenant, student_id, book_id)
            .await?
        {
            Ok(HistoryOutcome::Removed)
        } else {
            Ok(HistoryOutcome::StudentNotFound)
        }
    }

    /// Commit a scan batch: one issue/return per token, strictly sequential.
    ///
    /// A failing token never aborts the rest; store errors are downgraded to
    /// that token's failure entry so the batch always produces a report.
    /// Report order matches token order.
    pub async fn commit_batch(
        &self,
        tenant: TenantId,
        mode: CirculationMode,
        student_token: Option<&str>,
        book_tokens: &[String],
        loan_duration_days: u32,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for token in book_tokens {
            match mode {
                CirculationMode::Issue => {
                    let student = student_token.unwrap_or_default();
                    match self
                        .issue_book(tenant, token, student, loan_duration_days)
                        .await
                    {
                        Ok(outcome) if outcome.is_success() => {
                            report.record_success(token, outcome.message());
                        }
                        Ok(outcome) => report.record_failure(token, outcome.message()),
                        Err(e) => {
                            tracing::error!(token = %token, error = %e, "batch issue failed");
                            report.record_failure(token, "Sistem hatası");
                        }
                    }
                }
                CirculationMode::Return => match self.return_book(tenant, token).await {
                    Ok(outcome) if outcome.is_success() => {
                        report.record_success(token, outcome.message());
                    }
                    Ok(outcome) => report.record_failure(token, outcome.message()),
                    Err(e) => {
                        tracing::error!(token = %token, error = %e, "batch return failed");
                        report.record_failure(token, "Sistem hatası");
                    }
                },
            }
        }

        report
    }
}
