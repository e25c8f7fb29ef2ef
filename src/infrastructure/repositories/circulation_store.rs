//! SeaORM implementation of CirculationStore

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::{
    BookRecord, BookStatus, CirculationStore, DomainError, NewLoan, OpenLoan, StudentRecord,
    TenantId,
};
use crate::models::book::{self, Entity as BookEntity};
use crate::models::student::{self, Entity as StudentEntity};
use crate::models::transaction::{self, Entity as TransactionEntity};

/// SeaORM-based implementation of the catalog/ledger access contract
pub struct SeaOrmCirculationStore {
    db: DatabaseConnection,
}

impl SeaOrmCirculationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn book_record(model: book::Model) -> BookRecord {
    BookRecord {
        id: model.id,
        title: model.title,
        author: model.author,
        isbn: model.isbn,
        category: model.category,
        status: BookStatus::parse(&model.status),
    }
}

fn student_record(model: student::Model) -> StudentRecord {
    let reading_history = model.history();
    StudentRecord {
        id: model.id,
        name: model.name,
        student_number: model.student_number,
        grade: model.grade,
        email: model.email,
        reading_history,
    }
}

#[async_trait]
impl CirculationStore for SeaOrmCirculationStore {
    async fn find_book_by_token(
        &self,
        tenant: TenantId,
        token: &str,
    ) -> Result<Option<BookRecord>, DomainError> {
        let model = BookEntity::find()
            .filter(book::Column::TeacherId.eq(tenant.0))
            .filter(book::Column::Isbn.eq(token))
            .one(&self.db)
            .await?;

        Ok(model.map(book_record))
    }

    async fn find_student_by_token(
        &self,
        tenant: TenantId,
        token: &str,
    ) -> Result<Option<StudentRecord>, DomainError> {
        let model = StudentEntity::find()
            .filter(student::Column::TeacherId.eq(tenant.0))
            .filter(student::Column::StudentNumber.eq(token))
            .one(&self.db)
            .await?;

        Ok(model.map(student_record))
    }

    async fn try_mark_book_borrowed(
        &self,
        tenant: TenantId,
        book_id: i32,
    ) -> Result<bool, DomainError> {
        // Single conditional write: the status filter makes the availability
        // check and the flip atomic, so two racing issue calls cannot both
        // succeed for the same book.
        let result = BookEntity::update_many()
            .col_expr(
                book::Column::Status,
                Expr::value(BookStatus::Borrowed.as_str()),
            )
            .filter(book::Column::TeacherId.eq(tenant.0))
            .filter(book::Column::Id.eq(book_id))
            .filter(book::Column::Status.eq(BookStatus::Available.as_str()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn set_book_status(
        &self,
        tenant: TenantId,
        book_id: i32,
        status: BookStatus,
    ) -> Result<(), DomainError> {
        BookEntity::update_many()
            .col_expr(book::Column::Status, Expr::value(status.as_str()))
            .filter(book::Column::TeacherId.eq(tenant.0))
            .filter(book::Column::Id.eq(book_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn create_transaction(
        &self,
        tenant: TenantId,
        loan: NewLoan,
    ) -> Result<i32, DomainError> {
        let new_transaction = transaction::ActiveModel {
            teacher_id: Set(tenant.0),
            book_id: Set(loan.book_id),
            student_id: Set(loan.student_id),
            issue_date: Set(loan.issue_date),
            due_date: Set(loan.due_date),
            return_date: Set(None),
            is_returned: Set(false),
            ..Default::default()
        };

        let saved = new_transaction.insert(&self.db).await?;
        Ok(saved.id)
    }

    async fn find_open_transaction_for_book(
        &self,
        tenant: TenantId,
        book_id: i32,
    ) -> Result<Option<OpenLoan>, DomainError> {
        // First matching open entry; the issue invariant keeps this unique.
        let model = TransactionEntity::find()
            .filter(transaction::Column::TeacherId.eq(tenant.0))
            .filter(transaction::Column::BookId.eq(book_id))
            .filter(transaction::Column::IsReturned.eq(false))
            .order_by_asc(transaction::Column::Id)
            .one(&self.db)
            .await?;

        Ok(model.map(|t| OpenLoan {
            id: t.id,
            book_id: t.book_id,
            student_id: t.student_id,
            issue_date: t.issue_date,
            due_date: t.due_date,
        }))
    }

    async fn mark_transaction_returned(
        &self,
        tenant: TenantId,
        transaction_id: i32,
        return_date: &str,
    ) -> Result<(), DomainError> {
        let model = TransactionEntity::find_by_id(transaction_id)
            .filter(transaction::Column::TeacherId.eq(tenant.0))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(format!("transaction {} disappeared", transaction_id))
            })?;

        let mut active: transaction::ActiveModel = model.into();
        active.is_returned = Set(true);
        active.return_date = Set(Some(return_date.to_string()));
        active.update(&self.db).await?;

        Ok(())
    }

    async fn append_to_history(
        &self,
        tenant: TenantId,
        student_id: i32,
        book_id: i32,
    ) -> Result<(), DomainError> {
        let model = StudentEntity::find_by_id(student_id)
            .filter(student::Column::TeacherId.eq(tenant.0))
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("student {} disappeared", student_id)))?;

        let mut history = model.history();
        history.push(book_id);

        let mut active: student::ActiveModel = model.into();
        active.reading_history = Set(serde_json::to_string(&history).unwrap_or_default());
        active.update(&self.db).await?;

        Ok(())
    }

    async fn remove_from_history(
        &self,
        tenant: TenantId,
        student_id: i32,
        book_id: i32,
    ) -> Result<bool, DomainError> {
        let Some(model) = StudentEntity::find_by_id(student_id)
            .filter(student::Column::TeacherId.eq(tenant.0))
            .one(&self.db)
            .await?
        else {
            return Ok(false);
        };

        let mut history = model.history();
        // One occurrence only: a student who read the book twice keeps the
        // other entry.
        if let Some(pos) = history.iter().position(|id| *id == book_id) {
            history.remove(pos);

            let mut active: student::ActiveModel = model.into();
            active.reading_history = Set(serde_json::to_string(&history).unwrap_or_default());
            active.update(&self.db).await?;
        }

        Ok(true)
    }
}
