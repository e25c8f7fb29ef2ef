use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Tenant;
use crate::domain::BookStatus;
use crate::models::book::{self, Entity as Book};

pub async fn list_books(
    State(db): State<DatabaseConnection>,
    Tenant(tenant): Tenant,
) -> Result<Json<Value>, (StatusCode, String)> {
    let books = Book::find()
        .filter(book::Column::TeacherId.eq(tenant.0))
        .order_by_desc(book::Column::AddedDate)
        .all(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({ "books": books })))
}

#[derive(Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
}

pub async fn create_book(
    State(db): State<DatabaseConnection>,
    Tenant(tenant): Tenant,
    Json(payload): Json<CreateBookRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let isbn = payload.isbn.trim().to_string();
    if isbn.is_empty() || payload.title.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Kitap adı ve ISBN zorunludur.".to_string(),
        ));
    }

    // ISBN is the scan token: unique within this teacher's catalog
    let existing = Book::find()
        .filter(book::Column::TeacherId.eq(tenant.0))
        .filter(book::Column::Isbn.eq(&isbn))
        .one(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            "Bu ISBN numarasına sahip bir kitap zaten var.".to_string(),
        ));
    }

    // Status is forced to AVAILABLE on creation; only the circulation
    // engine mutates it afterwards.
    let new_book = book::ActiveModel {
        teacher_id: Set(tenant.0),
        title: Set(payload.title.trim().to_string()),
        author: Set(payload.author.trim().to_string()),
        isbn: Set(isbn),
        category: Set(payload.category.trim().to_string()),
        status: Set(BookStatus::Available.as_str().to_string()),
        added_date: Set(Utc::now().to_rfc3339()),
        ..Default::default()
    };

    let saved = new_book
        .insert(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Kitap başarıyla eklendi.",
        "book": saved
    })))
}

pub async fn delete_book(
    State(db): State<DatabaseConnection>,
    Tenant(tenant): Tenant,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let result = Book::delete_many()
        .filter(book::Column::TeacherId.eq(tenant.0))
        .filter(book::Column::Id.eq(id))
        .exec(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if result.rows_affected == 0 {
        return Err((StatusCode::NOT_FOUND, "Kitap bulunamadı.".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
