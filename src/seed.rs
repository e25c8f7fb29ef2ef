//! Demo data for a fresh installation (enabled with SEED_DEMO=1)

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::models::{book, student};

const DEMO_TEACHER_ID: i32 = 1;

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let existing = book::Entity::find()
        .filter(book::Column::TeacherId.eq(DEMO_TEACHER_ID))
        .count(db)
        .await?;
    if existing > 0 {
        tracing::info!("demo catalog already present, skipping seed");
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();

    let books = [
        ("Küçük Prens", "Antoine de Saint-Exupéry", "978-6053609902", "Roman"),
        ("Şeker Portakalı", "José Mauro de Vasconcelos", "978-9750738609", "Roman"),
        ("Momo", "Michael Ende", "978-9755105239", "Fantastik"),
        ("Charlie'nin Çikolata Fabrikası", "Roald Dahl", "978-9755104140", "Macera"),
        ("Define Adası", "Robert Louis Stevenson", "978-9944885959", "Macera"),
    ];

    for (title, author, isbn, category) in books {
        book::ActiveModel {
            teacher_id: Set(DEMO_TEACHER_ID),
            title: Set(title.to_string()),
            author: Set(author.to_string()),
            isbn: Set(isbn.to_string()),
            category: Set(category.to_string()),
            status: Set("AVAILABLE".to_string()),
            added_date: Set(now.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    let students = [
        ("Elif Yılmaz", "101", "5-A"),
        ("Mert Demir", "102", "5-A"),
        ("Zeynep Kaya", "201", "5-B"),
    ];

    for (name, number, grade) in students {
        student::ActiveModel {
            teacher_id: Set(DEMO_TEACHER_ID),
            name: Set(name.to_string()),
            student_number: Set(number.to_string()),
            grade: Set(grade.to_string()),
            email: Set(None),
            reading_history: Set("[]".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
