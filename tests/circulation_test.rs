use std::sync::Arc;

use chrono::DateTime;
use libratech::db;
use libratech::domain::{
    BookStatus, CirculationMode, HistoryOutcome, IssueOutcome, ReturnOutcome, TenantId, Verdict,
};
use libratech::infrastructure::SeaOrmCirculationStore;
use libratech::models::{book, student, transaction};
use libratech::services::CirculationEngine;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
};

const TENANT: TenantId = TenantId(1);

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    // In-memory SQLite for testing
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

fn make_engine(db: &DatabaseConnection) -> CirculationEngine {
    CirculationEngine::new(Arc::new(SeaOrmCirculationStore::new(db.clone())))
}

// Helper to create a test book
async fn create_test_book(db: &DatabaseConnection, teacher_id: i32, title: &str, isbn: &str) -> i32 {
    let model = book::ActiveModel {
        teacher_id: Set(teacher_id),
        title: Set(title.to_string()),
        author: Set("Test Author".to_string()),
        isbn: Set(isbn.to_string()),
        category: Set("Roman".to_string()),
        status: Set("AVAILABLE".to_string()),
        added_date: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let res = book::Entity::insert(model)
        .exec(db)
        .await
        .expect("Failed to create book");
    res.last_insert_id
}

// Helper to create a test student
async fn create_test_student(
    db: &DatabaseConnection,
    teacher_id: i32,
    name: &str,
    number: &str,
) -> i32 {
    let model = student::ActiveModel {
        teacher_id: Set(teacher_id),
        name: Set(name.to_string()),
        student_number: Set(number.to_string()),
        grade: Set("5-A".to_string()),
        email: Set(None),
        reading_history: Set("[]".to_string()),
        ..Default::default()
    };
    let res = student::Entity::insert(model)
        .exec(db)
        .await
        .expect("Failed to create student");
    res.last_insert_id
}

async fn book_status(db: &DatabaseConnection, id: i32) -> BookStatus {
    let model = book::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query failed")
        .expect("book missing");
    BookStatus::parse(&model.status)
}

async fn open_transaction_count(db: &DatabaseConnection, book_id: i32) -> u64 {
    transaction::Entity::find()
        .filter(transaction::Column::BookId.eq(book_id))
        .filter(transaction::Column::IsReturned.eq(false))
        .count(db)
        .await
        .expect("count failed")
}

async fn reading_history(db: &DatabaseConnection, student_id: i32) -> Vec<i32> {
    student::Entity::find_by_id(student_id)
        .one(db)
        .await
        .expect("query failed")
        .expect("student missing")
        .history()
}

#[tokio::test]
async fn issue_creates_open_transaction_and_flips_status() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let book_id = create_test_book(&db, 1, "Küçük Prens", "978-000").await;
    let student_id = create_test_student(&db, 1, "Elif Yılmaz", "101").await;

    let outcome = engine
        .issue_book(TENANT, "978-000", "101", 14)
        .await
        .expect("store should not fail");

    let IssueOutcome::Issued {
        transaction_id,
        warning,
    } = outcome
    else {
        panic!("expected issue to succeed, got {:?}", outcome);
    };
    assert!(warning.is_none(), "first read must not warn");

    assert_eq!(book_status(&db, book_id).await, BookStatus::Borrowed);
    assert_eq!(reading_history(&db, student_id).await, vec![book_id]);

    let tx = transaction::Entity::find_by_id(transaction_id)
        .one(&db)
        .await
        .expect("query failed")
        .expect("transaction missing");
    assert_eq!(tx.book_id, book_id);
    assert_eq!(tx.student_id, student_id);
    assert!(!tx.is_returned);
    assert!(tx.return_date.is_none());

    // Due date is issue date plus the requested duration
    let issued = DateTime::parse_from_rfc3339(&tx.issue_date).expect("bad issue date");
    let due = DateTime::parse_from_rfc3339(&tx.due_date).expect("bad due date");
    assert_eq!(due - issued, chrono::Duration::days(14));
}

#[tokio::test]
async fn issue_refuses_borrowed_book_without_new_transaction() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let book_id = create_test_book(&db, 1, "Küçük Prens", "978-000").await;
    create_test_student(&db, 1, "Elif Yılmaz", "101").await;
    create_test_student(&db, 1, "Mert Demir", "102").await;

    let first = engine.issue_book(TENANT, "978-000", "101", 14).await.unwrap();
    assert!(first.is_success());

    let second = engine.issue_book(TENANT, "978-000", "102", 14).await.unwrap();
    assert_eq!(second, IssueOutcome::BookUnavailable);
    assert_eq!(second.message(), "Kitap şu anda başkasında ödünçte.");

    // At most one open transaction per book, status unchanged
    assert_eq!(open_transaction_count(&db, book_id).await, 1);
    assert_eq!(book_status(&db, book_id).await, BookStatus::Borrowed);
}

#[tokio::test]
async fn issue_reports_missing_book_and_student_in_order() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    create_test_student(&db, 1, "Elif Yılmaz", "101").await;

    let outcome = engine.issue_book(TENANT, "978-404", "101", 14).await.unwrap();
    assert_eq!(outcome, IssueOutcome::BookNotFound);

    let book_id = create_test_book(&db, 1, "Momo", "978-001").await;
    let outcome = engine.issue_book(TENANT, "978-001", "999", 14).await.unwrap();
    assert_eq!(outcome, IssueOutcome::StudentNotFound);

    // Neither attempt touched the catalog or the ledger
    assert_eq!(book_status(&db, book_id).await, BookStatus::Available);
    assert_eq!(open_transaction_count(&db, book_id).await, 0);
}

#[tokio::test]
async fn return_closes_loan_and_repeat_return_is_refused() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let book_id = create_test_book(&db, 1, "Küçük Prens", "978-000").await;
    create_test_student(&db, 1, "Elif Yılmaz", "101").await;

    engine.issue_book(TENANT, "978-000", "101", 14).await.unwrap();

    let outcome = engine.return_book(TENANT, "978-000").await.unwrap();
    let ReturnOutcome::Returned { transaction_id } = outcome else {
        panic!("expected return to succeed, got {:?}", outcome);
    };

    assert_eq!(book_status(&db, book_id).await, BookStatus::Available);
    assert_eq!(open_transaction_count(&db, book_id).await, 0);

    let tx = transaction::Entity::find_by_id(transaction_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(tx.is_returned);
    assert!(tx.return_date.is_some());

    // Returning twice in a row: success then NoActiveLoan
    let again = engine.return_book(TENANT, "978-000").await.unwrap();
    assert_eq!(again, ReturnOutcome::NoActiveLoan);
    assert_eq!(again.message(), "Bu kitap şu anda ödünçte görünmüyor.");
}

#[tokio::test]
async fn return_of_unknown_book_is_refused() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let outcome = engine.return_book(TENANT, "978-404").await.unwrap();
    assert_eq!(outcome, ReturnOutcome::BookNotFound);
}

#[tokio::test]
async fn reissue_to_same_student_warns_but_succeeds() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let book_id = create_test_book(&db, 1, "Şeker Portakalı", "978-111").await;
    let student_id = create_test_student(&db, 1, "Elif Yılmaz", "101").await;

    engine.issue_book(TENANT, "978-111", "101", 14).await.unwrap();
    engine.return_book(TENANT, "978-111").await.unwrap();

    let outcome = engine.issue_book(TENANT, "978-111", "101", 7).await.unwrap();
    let IssueOutcome::Issued { warning, .. } = outcome else {
        panic!("duplicate read must not block the loan, got {:?}", outcome);
    };
    let warning = warning.expect("expected duplicate-read warning");
    assert!(warning.contains("Elif Yılmaz"));
    assert!(warning.contains("Şeker Portakalı"));

    // Second reading recorded as a second history entry
    assert_eq!(reading_history(&db, student_id).await, vec![book_id, book_id]);
    assert_eq!(open_transaction_count(&db, book_id).await, 1);
}

#[tokio::test]
async fn check_probe_covers_all_verdicts_and_mutates_nothing() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let free_id = create_test_book(&db, 1, "Momo", "978-001").await;
    create_test_book(&db, 1, "Define Adası", "978-002").await;
    create_test_book(&db, 1, "Küçük Prens", "978-003").await;
    let student_id = create_test_student(&db, 1, "Elif Yılmaz", "101").await;

    // Borrow one book, put another into the student's history
    engine.issue_book(TENANT, "978-002", "101", 14).await.unwrap();
    engine.issue_book(TENANT, "978-003", "101", 14).await.unwrap();
    engine.return_book(TENANT, "978-003").await.unwrap();
    let history_before = reading_history(&db, student_id).await;

    let verdict = engine
        .check_book_for_student(TENANT, "978-404", Some("101"))
        .await
        .unwrap();
    assert_eq!(verdict, Verdict::NotFound);

    let verdict = engine
        .check_book_for_student(TENANT, "978-002", Some("101"))
        .await
        .unwrap();
    assert_eq!(verdict, Verdict::NotAvailable);

    let verdict = engine
        .check_book_for_student(TENANT, "978-003", Some("101"))
        .await
        .unwrap();
    assert_eq!(verdict, Verdict::AlreadyRead);

    let verdict = engine
        .check_book_for_student(TENANT, "978-001", Some("101"))
        .await
        .unwrap();
    assert_eq!(verdict, Verdict::Valid);

    // Without a student token the history rule does not apply
    let verdict = engine
        .check_book_for_student(TENANT, "978-003", None)
        .await
        .unwrap();
    assert_eq!(verdict, Verdict::Valid);

    // Probe is read-only
    assert_eq!(book_status(&db, free_id).await, BookStatus::Available);
    assert_eq!(reading_history(&db, student_id).await, history_before);
}

#[tokio::test]
async fn history_correction_removes_a_single_occurrence() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let book_id = create_test_book(&db, 1, "Momo", "978-001").await;
    let student_id = create_test_student(&db, 1, "Elif Yılmaz", "101").await;

    engine.issue_book(TENANT, "978-001", "101", 14).await.unwrap();
    engine.return_book(TENANT, "978-001").await.unwrap();
    engine.issue_book(TENANT, "978-001", "101", 14).await.unwrap();
    assert_eq!(reading_history(&db, student_id).await.len(), 2);

    let outcome = engine
        .remove_book_from_history(TENANT, student_id, book_id)
        .await
        .unwrap();
    assert_eq!(outcome, HistoryOutcome::Removed);
    assert_eq!(reading_history(&db, student_id).await, vec![book_id]);

    // Ledger and status are untouched by the correction
    assert_eq!(open_transaction_count(&db, book_id).await, 1);
    assert_eq!(book_status(&db, book_id).await, BookStatus::Borrowed);

    let outcome = engine
        .remove_book_from_history(TENANT, 9999, book_id)
        .await
        .unwrap();
    assert_eq!(outcome, HistoryOutcome::StudentNotFound);
    assert_eq!(outcome.message(), "Öğrenci bulunamadı.");
}

#[tokio::test]
async fn engine_never_crosses_tenant_partitions() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    create_test_book(&db, 1, "Küçük Prens", "978-000").await;
    create_test_student(&db, 1, "Elif Yılmaz", "101").await;
    create_test_student(&db, 2, "Başka Sınıf", "101").await;

    // Tenant 2 cannot see tenant 1's catalog
    let outcome = engine
        .issue_book(TenantId(2), "978-000", "101", 14)
        .await
        .unwrap();
    assert_eq!(outcome, IssueOutcome::BookNotFound);

    // Tenant 1 cannot issue to tenant 2's duplicate-numbered student; the
    // token resolves within its own partition only
    let outcome = engine.issue_book(TENANT, "978-000", "101", 14).await.unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn batch_attempts_every_token_and_keeps_scan_order() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    create_test_book(&db, 1, "Momo", "978-001").await;
    create_test_book(&db, 1, "Define Adası", "978-002").await;
    create_test_book(&db, 1, "Küçük Prens", "978-003").await;
    create_test_student(&db, 1, "Elif Yılmaz", "101").await;
    create_test_student(&db, 1, "Mert Demir", "102").await;

    // Token 2 is already on loan to someone else
    engine.issue_book(TENANT, "978-002", "102", 14).await.unwrap();

    let tokens = vec![
        "978-001".to_string(),
        "978-002".to_string(),
        "978-003".to_string(),
    ];
    let report = engine
        .commit_batch(TENANT, CirculationMode::Issue, Some("101"), &tokens, 14)
        .await;

    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 1);
    assert!(!report.is_clean());
    assert!(report.successes[0].starts_with("978-001:"));
    assert!(report.successes[1].starts_with("978-003:"));
    assert_eq!(
        report.failures[0],
        "978-002: Kitap şu anda başkasında ödünçte."
    );
    assert_eq!(report.summary(CirculationMode::Issue), "2 kitap başarılı, 1 kitapta hata oluştu.");
}

#[tokio::test]
async fn clean_return_batch_restores_inventory() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let book_a = create_test_book(&db, 1, "Momo", "978-001").await;
    let book_b = create_test_book(&db, 1, "Define Adası", "978-002").await;
    create_test_student(&db, 1, "Elif Yılmaz", "101").await;

    engine.issue_book(TENANT, "978-001", "101", 14).await.unwrap();
    engine.issue_book(TENANT, "978-002", "101", 14).await.unwrap();

    let tokens = vec!["978-001".to_string(), "978-002".to_string()];
    let report = engine
        .commit_batch(TENANT, CirculationMode::Return, None, &tokens, 14)
        .await;

    assert!(report.is_clean());
    assert_eq!(report.success_count(), 2);
    assert_eq!(
        report.summary(CirculationMode::Return),
        "Toplam 2 kitap başarıyla iade alındı."
    );
    assert_eq!(book_status(&db, book_a).await, BookStatus::Available);
    assert_eq!(book_status(&db, book_b).await, BookStatus::Available);
}

#[tokio::test]
async fn status_and_ledger_stay_consistent_over_a_cycle() {
    let db = setup_test_db().await;
    let engine = make_engine(&db);

    let book_id = create_test_book(&db, 1, "Momo", "978-001").await;
    create_test_student(&db, 1, "Elif Yılmaz", "101").await;

    // BORROWED if and only if an open transaction exists
    for _ in 0..3 {
        engine.issue_book(TENANT, "978-001", "101", 14).await.unwrap();
        assert_eq!(book_status(&db, book_id).await, BookStatus::Borrowed);
        assert_eq!(open_transaction_count(&db, book_id).await, 1);

        engine.return_book(TENANT, "978-001").await.unwrap();
        assert_eq!(book_status(&db, book_id).await, BookStatus::Available);
        assert_eq!(open_transaction_count(&db, book_id).await, 0);
    }

    // The ledger kept every closed record
    let total = transaction::Entity::find()
        .filter(transaction::Column::BookId.eq(book_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(total, 3);
}
