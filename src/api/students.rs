use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::Tenant;
use crate::infrastructure::AppState;
use crate::models::book::{self, Entity as Book};
use crate::models::student::{self, Entity as Student};

pub async fn list_students(
    State(db): State<DatabaseConnection>,
    Tenant(tenant): Tenant,
) -> Result<Json<Value>, (StatusCode, String)> {
    let students = Student::find()
        .filter(student::Column::TeacherId.eq(tenant.0))
        .order_by_asc(student::Column::Name)
        .all(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let students: Vec<student::Student> = students.into_iter().map(Into::into).collect();

    Ok(Json(json!({ "students": students })))
}

#[derive(Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub student_number: String,
    pub grade: String,
    pub email: Option<String>,
}

pub async fn create_student(
    State(db): State<DatabaseConnection>,
    Tenant(tenant): Tenant,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let number = payload.student_number.trim().to_string();
    if number.is_empty() || payload.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Öğrenci adı ve numarası zorunludur.".to_string(),
        ));
    }

    // Student number is the scan token: unique within this teacher's roster
    let existing = Student::find()
        .filter(student::Column::TeacherId.eq(tenant.0))
        .filter(student::Column::StudentNumber.eq(&number))
        .one(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            "Bu numaraya sahip bir öğrenci zaten kayıtlı.".to_string(),
        ));
    }

    let new_student = student::ActiveModel {
        teacher_id: Set(tenant.0),
        name: Set(payload.name.trim().to_string()),
        student_number: Set(number),
        grade: Set(payload.grade.trim().to_string()),
        email: Set(payload.email),
        reading_history: Set("[]".to_string()),
        ..Default::default()
    };

    let saved = new_student
        .insert(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Öğrenci başarıyla eklendi.",
        "student": student::Student::from(saved)
    })))
}

pub async fn delete_student(
    State(db): State<DatabaseConnection>,
    Tenant(tenant): Tenant,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let result = Student::delete_many()
        .filter(student::Column::TeacherId.eq(tenant.0))
        .filter(student::Column::Id.eq(id))
        .exec(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if result.rows_affected == 0 {
        return Err((StatusCode::NOT_FOUND, "Öğrenci bulunamadı.".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}

/// Administrative correction of a student's reading history.
pub async fn remove_history_entry(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path((id, book_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let outcome = state
        .engine
        .remove_book_from_history(tenant, id, book_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if !outcome.is_success() {
        return Err((StatusCode::NOT_FOUND, outcome.message().to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": outcome.message()
    })))
}

/// Read-only parent view: a child's reading history by student number.
pub async fn lookup_student(
    State(db): State<DatabaseConnection>,
    Tenant(tenant): Tenant,
    Path(student_number): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let Some(found) = Student::find()
        .filter(student::Column::TeacherId.eq(tenant.0))
        .filter(student::Column::StudentNumber.eq(student_number.trim()))
        .one(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    else {
        return Err((StatusCode::NOT_FOUND, "Öğrenci bulunamadı.".to_string()));
    };

    let history = found.history();

    let mut book_map: HashMap<i32, book::Model> = HashMap::new();
    if !history.is_empty() {
        let books = Book::find()
            .filter(book::Column::TeacherId.eq(tenant.0))
            .filter(book::Column::Id.is_in(history.clone()))
            .all(&db)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        for b in books {
            book_map.insert(b.id, b);
        }
    }

    // One entry per occurrence, in reading order; deleted books keep a
    // placeholder so the count stays honest.
    let resolved: Vec<Value> = history
        .iter()
        .map(|id| match book_map.get(id) {
            Some(b) => json!({
                "book_id": id,
                "title": b.title,
                "author": b.author,
                "category": b.category
            }),
            None => json!({
                "book_id": id,
                "title": "Bilinmeyen Kitap",
                "author": null,
                "category": null
            }),
        })
        .collect();

    Ok(Json(json!({
        "student": {
            "name": found.name,
            "student_number": found.student_number,
            "grade": found.grade
        },
        "books_read": history.len(),
        "history": resolved
    })))
}
