//! Scanning session state machine and batch coordinator
//!
//! `ScanSession` is the pure state machine: token arrivals, the debounce
//! window, batch de-duplication, completion and cancellation - no store
//! calls, no rendering. `ScanCoordinator` drives a session against the
//! circulation engine: pre-flight validation of book scans in issue mode
//! and the sequential commit on completion.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{BatchReport, CirculationMode, TenantId};
use crate::services::CirculationEngine;

/// Repeated camera reads of one physical code arrive well under this window.
const DEBOUNCE_MS: i64 = 1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Issue sessions start here; the first token is the student identity.
    AwaitingStudent,
    /// Collecting book tokens. Return sessions start here.
    AwaitingBooks,
    /// Batch handed off for commit; the session no longer accepts scans.
    Committing,
    Done,
    Cancelled,
}

/// What a single scan event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanObservation {
    /// Inside the debounce window of the previous processed scan.
    Debounced,
    /// Blank token, or the session is not in a collecting state.
    Ignored,
    StudentCaptured,
    /// Token already sits in the in-memory batch; rejected silently.
    DuplicateInBatch,
    /// Issue mode: caller must validate before `accept_book`.
    BookCandidate,
    /// Return mode: added without pre-validation.
    BookAdded,
}

/// Snapshot handed to the commit loop on completion.
#[derive(Debug, Clone)]
pub struct ScanBatch {
    pub student_token: Option<String>,
    pub book_tokens: Vec<String>,
}

#[derive(Debug)]
pub struct ScanSession {
    id: Uuid,
    mode: CirculationMode,
    state: SessionState,
    student_token: Option<String>,
    book_tokens: Vec<String>,
    last_scan_at: Option<DateTime<Utc>>,
}

impl ScanSession {
    pub fn new(mode: CirculationMode) -> Self {
        let state = match mode {
            CirculationMode::Issue => SessionState::AwaitingStudent,
            CirculationMode::Return => SessionState::AwaitingBooks,
        };

        Self {
            id: Uuid::new_v4(),
            mode,
            state,
            student_token: None,
            book_tokens: Vec::new(),
            last_scan_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> CirculationMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn student_token(&self) -> Option<&str> {
        self.student_token.as_deref()
    }

    pub fn book_count(&self) -> usize {
        self.book_tokens.len()
    }

    /// Feed one scan event into the session.
    pub fn observe(&mut self, token: &str, at: DateTime<Utc>) -> ScanObservation {
        let token = token.trim();
        if token.is_empty() {
            return ScanObservation::Ignored;
        }

        if let Some(prev) = self.last_scan_at {
            if at - prev < Duration::milliseconds(DEBOUNCE_MS) {
                return ScanObservation::Debounced;
            }
        }

        match self.state {
            SessionState::AwaitingStudent => {
                self.last_scan_at = Some(at);
                self.student_token = Some(token.to_string());
                self.state = SessionState::AwaitingBooks;
                ScanObservation::StudentCaptured
            }
            SessionState::AwaitingBooks => {
                self.last_scan_at = Some(at);
                if self.book_tokens.iter().any(|t| t == token) {
                    return ScanObservation::DuplicateInBatch;
                }
                match self.mode {
                    CirculationMode::Issue => ScanObservation::BookCandidate,
                    CirculationMode::Return => {
                        self.book_tokens.push(token.to_string());
                        ScanObservation::BookAdded
                    }
                }
            }
            _ => ScanObservation::Ignored,
        }
    }

    /// Add a candidate token after external validation passed.
    pub fn accept_book(&mut self, token: &str) {
        if self.state == SessionState::AwaitingBooks {
            self.book_tokens.push(token.trim().to_string());
        }
    }

    /// Back to square one within the same session (the desk's "Sıfırla").
    pub fn reset(&mut self) {
        if matches!(
            self.state,
            SessionState::AwaitingStudent | SessionState::AwaitingBooks
        ) {
            self.student_token = None;
            self.book_tokens.clear();
            self.state = match self.mode {
                CirculationMode::Issue => SessionState::AwaitingStudent,
                CirculationMode::Return => SessionState::AwaitingBooks,
            };
        }
    }

    /// A batch is viable once it has a student (issue mode) and at least
    /// one book.
    pub fn can_complete(&self) -> bool {
        if self.state != SessionState::AwaitingBooks || self.book_tokens.is_empty() {
            return false;
        }
        match self.mode {
            CirculationMode::Issue => self.student_token.is_some(),
            CirculationMode::Return => true,
        }
    }

    /// Explicit user action ending collection. Returns the batch snapshot
    /// and moves to `Committing`; from there the session cannot be
    /// cancelled.
    pub fn complete(&mut self) -> Option<ScanBatch> {
        if !self.can_complete() {
            return None;
        }
        self.state = SessionState::Committing;
        Some(ScanBatch {
            student_token: self.student_token.clone(),
            book_tokens: self.book_tokens.clone(),
        })
    }

    /// Marks the committed batch as finished.
    pub fn finish(&mut self) {
        if self.state == SessionState::Committing {
            self.state = SessionState::Done;
        }
    }

    /// Cancellation is a clean no-op while collecting: nothing has been
    /// written yet. Returns false once committing has started.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            SessionState::AwaitingStudent | SessionState::AwaitingBooks => {
                self.state = SessionState::Cancelled;
                true
            }
            _ => false,
        }
    }
}

/// User-visible feedback for one scan event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFeedback {
    Debounced,
    Ignored,
    StudentCaptured { token: String },
    AlreadyInBatch,
    /// Pre-flight validation refused the book; not added.
    Rejected { message: String },
    Added { message: &'static str },
}

/// Drives one scanning session through the circulation engine.
pub struct ScanCoordinator {
    session: ScanSession,
    engine: Arc<CirculationEngine>,
    tenant: TenantId,
    loan_duration_days: u32,
}

impl ScanCoordinator {
    pub fn new(
        engine: Arc<CirculationEngine>,
        tenant: TenantId,
        mode: CirculationMode,
        loan_duration_days: u32,
    ) -> Self {
        Self {
            session: ScanSession::new(mode),
            engine,
            tenant,
            loan_duration_days,
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Handle a live scan event.
    pub async fn scan(&mut self, token: &str) -> ScanFeedback {
        self.scan_at(token, Utc::now()).await
    }

    /// Same as `scan` with an explicit event time.
    pub async fn scan_at(&mut self, token: &str, at: DateTime<Utc>) -> ScanFeedback {
        match self.session.observe(token, at) {
            ScanObservation::Debounced => ScanFeedback::Debounced,
            ScanObservation::Ignored => ScanFeedback::Ignored,
            ScanObservation::DuplicateInBatch => ScanFeedback::AlreadyInBatch,
            ScanObservation::StudentCaptured => ScanFeedback::StudentCaptured {
                token: token.trim().to_string(),
            },
            ScanObservation::BookAdded => ScanFeedback::Added {
                message: "İade Listesine Eklendi",
            },
            ScanObservation::BookCandidate => {
                let verdict = self
                    .engine
                    .check_book_for_student(self.tenant, token, self.session.student_token())
                    .await;

                match verdict {
                    Ok(v) if v.is_valid() => {
                        self.session.accept_book(token);
                        ScanFeedback::Added {
                            message: "Ödünç Listesine Eklendi",
                        }
                    }
                    Ok(v) => ScanFeedback::Rejected {
                        message: v.message().to_string(),
                    },
                    Err(e) => {
                        tracing::error!(session = %self.session.id(), error = %e, "scan validation failed");
                        ScanFeedback::Rejected {
                            message: "Hata oluştu.".to_string(),
                        }
                    }
                }
            }
        }
    }

    /// Commit the collected batch. `None` when the batch is not viable yet.
    /// Once started, the commit runs over every queued token.
    pub async fn complete(&mut self) -> Option<BatchReport> {
        let batch = self.session.complete()?;

        tracing::info!(
            session = %self.session.id(),
            books = batch.book_tokens.len(),
            "committing scan batch"
        );

        let report = self
            .engine
            .commit_batch(
                self.tenant,
                self.session.mode(),
                batch.student_token.as_deref(),
                &batch.book_tokens,
                self.loan_duration_days,
            )
            .await;

        self.session.finish();
        Some(report)
    }

    pub fn cancel(&mut self) -> bool {
        self.session.cancel()
    }
}
