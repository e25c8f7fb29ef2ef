use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Books: ISBN doubles as the scan token, unique per teacher
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            teacher_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            isbn TEXT NOT NULL,
            category TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'AVAILABLE',
            added_date TEXT NOT NULL,
            UNIQUE(teacher_id, isbn)
        );
        CREATE INDEX IF NOT EXISTS idx_books_teacher_id ON books(teacher_id);
        CREATE INDEX IF NOT EXISTS idx_books_status ON books(status);
        "#
        .to_owned(),
    ))
    .await?;

    // Students: student number doubles as the scan token, unique per teacher
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            teacher_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            student_number TEXT NOT NULL,
            grade TEXT NOT NULL,
            email TEXT,
            reading_history TEXT NOT NULL DEFAULT '[]',
            UNIQUE(teacher_id, student_number)
        );
        CREATE INDEX IF NOT EXISTS idx_students_teacher_id ON students(teacher_id);
        "#
        .to_owned(),
    ))
    .await?;

    // Transactions: append-only ledger, never deleted. References carry no
    // cascade: a deleted book or student leaves its loan records intact.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            teacher_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            student_id INTEGER NOT NULL,
            issue_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            return_date TEXT,
            is_returned INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_transactions_teacher_id ON transactions(teacher_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_book_id ON transactions(book_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_student_id ON transactions(student_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_is_returned ON transactions(is_returned);
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}
