//! Report Service - derived views over the catalog and the ledger
//!
//! Local aggregation only (counts, top reader, category histogram); nothing
//! here mutates state.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::{DomainError, TenantId};
use crate::models::book::{self, Entity as Book};
use crate::models::student::{self, Entity as Student};
use crate::models::transaction::{self, Entity as Transaction};

/// Open loan enriched with book and student details
#[derive(Debug, Clone, Serialize)]
pub struct ActiveLoanView {
    pub id: i32,
    pub book_id: i32,
    pub student_id: i32,
    pub issue_date: String,
    pub due_date: String,
    pub book_title: String,
    pub book_isbn: String,
    pub student_name: String,
    pub student_number: String,
}

/// List open transactions with related book and student info
pub async fn list_active_loans(
    db: &DatabaseConnection,
    tenant: TenantId,
) -> Result<Vec<ActiveLoanView>, DomainError> {
    let open = Transaction::find()
        .filter(transaction::Column::TeacherId.eq(tenant.0))
        .filter(transaction::Column::IsReturned.eq(false))
        .order_by_desc(transaction::Column::IssueDate)
        .all(db)
        .await?;

    if open.is_empty() {
        return Ok(Vec::new());
    }

    let book_ids: Vec<i32> = open.iter().map(|t| t.book_id).collect();
    let student_ids: Vec<i32> = open.iter().map(|t| t.student_id).collect();

    let mut book_map: HashMap<i32, book::Model> = HashMap::new();
    for b in Book::find()
        .filter(book::Column::Id.is_in(book_ids))
        .all(db)
        .await?
    {
        book_map.insert(b.id, b);
    }

    let mut student_map: HashMap<i32, student::Model> = HashMap::new();
    for s in Student::find()
        .filter(student::Column::Id.is_in(student_ids))
        .all(db)
        .await?
    {
        student_map.insert(s.id, s);
    }

    // Entries whose book or student was deleted are skipped rather than
    // rendered half-empty.
    let result = open
        .into_iter()
        .filter_map(|t| {
            let b = book_map.get(&t.book_id)?;
            let s = student_map.get(&t.student_id)?;
            Some(ActiveLoanView {
                id: t.id,
                book_id: t.book_id,
                student_id: t.student_id,
                issue_date: t.issue_date,
                due_date: t.due_date,
                book_title: b.title.clone(),
                book_isbn: b.isbn.clone(),
                student_name: s.name.clone(),
                student_number: s.student_number.clone(),
            })
        })
        .collect();

    Ok(result)
}

#[derive(Debug, Clone, Serialize)]
pub struct TopReader {
    pub name: String,
    pub grade: String,
    pub books_read: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeReading {
    pub grade: String,
    pub students: usize,
    pub books_read: usize,
}

#[derive(Debug, Serialize)]
pub struct LibraryStats {
    pub total_books: u64,
    pub total_students: u64,
    pub active_loans: u64,
    pub total_books_read: usize,
    pub top_reader: Option<TopReader>,
    pub categories: Vec<CategoryCount>,
    pub grades: Vec<GradeReading>,
}

/// Dashboard aggregates for one tenant.
pub async fn library_stats(
    db: &DatabaseConnection,
    tenant: TenantId,
) -> Result<LibraryStats, DomainError> {
    let total_books = Book::find()
        .filter(book::Column::TeacherId.eq(tenant.0))
        .count(db)
        .await?;

    let active_loans = Transaction::find()
        .filter(transaction::Column::TeacherId.eq(tenant.0))
        .filter(transaction::Column::IsReturned.eq(false))
        .count(db)
        .await?;

    let students = Student::find()
        .filter(student::Column::TeacherId.eq(tenant.0))
        .all(db)
        .await?;
    let total_students = students.len() as u64;

    let mut total_books_read = 0usize;
    let mut top_reader: Option<TopReader> = None;
    let mut grade_map: HashMap<String, (usize, usize)> = HashMap::new();

    for s in &students {
        let read = s.history().len();
        total_books_read += read;

        let entry = grade_map.entry(s.grade.clone()).or_default();
        entry.0 += 1;
        entry.1 += read;

        if top_reader.as_ref().map_or(true, |t| read > t.books_read) {
            top_reader = Some(TopReader {
                name: s.name.clone(),
                grade: s.grade.clone(),
                books_read: read,
            });
        }
    }

    // A roster with no readings has no top reader worth showing
    if total_books_read == 0 {
        top_reader = None;
    }

    let mut category_map: HashMap<String, u64> = HashMap::new();
    for b in Book::find()
        .filter(book::Column::TeacherId.eq(tenant.0))
        .all(db)
        .await?
    {
        *category_map.entry(b.category).or_default() += 1;
    }

    let mut categories: Vec<CategoryCount> = category_map
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));

    let mut grades: Vec<GradeReading> = grade_map
        .into_iter()
        .map(|(grade, (students, books_read))| GradeReading {
            grade,
            students,
            books_read,
        })
        .collect();
    grades.sort_by(|a, b| a.grade.cmp(&b.grade));

    Ok(LibraryStats {
        total_books,
        total_students,
        active_loans,
        total_books_read,
        top_reader,
        categories,
        grades,
    })
}
