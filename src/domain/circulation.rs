//! Per-operation outcome types for the circulation engine.
//!
//! Each operation has a closed set of results; preconditions that fail are
//! variants here, never errors. The user-facing messages are Turkish, as
//! shown at the scanning desk.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CirculationMode {
    Issue,
    Return,
}

/// Result of an issue attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueOutcome {
    /// Loan created. `warning` carries the "already read" advisory, which
    /// never blocks the loan.
    Issued {
        transaction_id: i32,
        warning: Option<String>,
    },
    BookNotFound,
    StudentNotFound,
    BookUnavailable,
}

impl IssueOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, IssueOutcome::Issued { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            IssueOutcome::Issued { .. } => "Kitap başarıyla ödünç verildi.",
            IssueOutcome::BookNotFound => "Bu ISBN/QR kodu ile kitap bulunamadı.",
            IssueOutcome::StudentNotFound => "Bu numara/QR ile öğrenci bulunamadı.",
            IssueOutcome::BookUnavailable => "Kitap şu anda başkasında ödünçte.",
        }
    }
}

/// Result of a return attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
    Returned { transaction_id: i32 },
    BookNotFound,
    NoActiveLoan,
}

impl ReturnOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReturnOutcome::Returned { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            ReturnOutcome::Returned { .. } => "Kitap envantere başarıyla iade edildi.",
            ReturnOutcome::BookNotFound => "Kitap bulunamadı.",
            ReturnOutcome::NoActiveLoan => "Bu kitap şu anda ödünçte görünmüyor.",
        }
    }
}

/// Verdict of the read-only pre-flight probe during scanning.
///
/// Advisory only: the authoritative decision is still made at commit time,
/// so a VALID verdict may go stale before the issue lands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Valid,
    NotFound,
    NotAvailable,
    AlreadyRead,
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Valid => "Uygun",
            Verdict::NotFound => "Kitap bulunamadı.",
            Verdict::NotAvailable => "Kitap şu anda ödünçte.",
            Verdict::AlreadyRead => "Bu öğrenci bu kitabı daha önce okumuş!",
        }
    }
}

/// Result of the administrative history correction.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    Removed,
    StudentNotFound,
}

impl HistoryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, HistoryOutcome::Removed)
    }

    pub fn message(&self) -> &'static str {
        match self {
            HistoryOutcome::Removed => "Kitap geçmişten silindi.",
            HistoryOutcome::StudentNotFound => "Öğrenci bulunamadı.",
        }
    }
}

/// Per-run report of a committed scan batch. Entry order matches scan order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub successes: Vec<String>,
    pub failures: Vec<String>,
}

impl BatchReport {
    pub fn record_success(&mut self, token: &str, message: &str) {
        self.successes.push(format!("{}: {}", token, message));
    }

    pub fn record_failure(&mut self, token: &str, message: &str) {
        self.failures.push(format!("{}: {}", token, message));
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Clean only when no token failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line Turkish summary shown after the batch finishes.
    pub fn summary(&self, mode: CirculationMode) -> String {
        if self.is_clean() {
            let verb = match mode {
                CirculationMode::Issue => "ödünç verildi",
                CirculationMode::Return => "iade alındı",
            };
            format!("Toplam {} kitap başarıyla {}.", self.success_count(), verb)
        } else {
            format!(
                "{} kitap başarılı, {} kitapta hata oluştu.",
                self.success_count(),
                self.failure_count()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_clean_only_without_failures() {
        let mut report = BatchReport::default();
        report.record_success("978-000", "Kitap başarıyla ödünç verildi.");
        assert!(report.is_clean());

        report.record_failure("978-001", "Kitap şu anda başkasında ödünçte.");
        assert!(!report.is_clean());
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0], "978-001: Kitap şu anda başkasında ödünçte.");
    }

    #[test]
    fn summary_wording_follows_mode_and_outcome() {
        let mut report = BatchReport::default();
        report.record_success("978-000", "ok");
        report.record_success("978-001", "ok");
        assert_eq!(
            report.summary(CirculationMode::Issue),
            "Toplam 2 kitap başarıyla ödünç verildi."
        );
        assert_eq!(
            report.summary(CirculationMode::Return),
            "Toplam 2 kitap başarıyla iade alındı."
        );

        report.record_failure("978-002", "err");
        assert_eq!(
            report.summary(CirculationMode::Issue),
            "2 kitap başarılı, 1 kitapta hata oluştu."
        );
    }
}
