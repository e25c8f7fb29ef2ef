pub mod books;
pub mod circulation;
pub mod health;
pub mod reports;
pub mod students;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    routing::{delete, get, post},
    Router,
};

use crate::domain::TenantId;
use crate::infrastructure::AppState;

/// Tenant partition of the signed-in teacher, taken from the `X-Teacher-Id`
/// header set by the identity layer in front of this service. The value is
/// threaded explicitly into every store and engine call.
pub struct Tenant(pub TenantId);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-teacher-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i32>().ok())
            .map(|id| Tenant(TenantId(id)))
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing or invalid X-Teacher-Id header".to_string(),
            ))
    }
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Book inventory
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/:id", delete(books::delete_book))
        // Student roster
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route("/students/:id", delete(students::delete_student))
        .route(
            "/students/:id/history/:book_id",
            delete(students::remove_history_entry),
        )
        // Parent view (read-only)
        .route(
            "/students/lookup/:student_number",
            get(students::lookup_student),
        )
        // Circulation
        .route("/circulation/issue", post(circulation::issue_book))
        .route("/circulation/return", post(circulation::return_book))
        .route("/circulation/check", get(circulation::check_book))
        .route("/circulation/batch", post(circulation::commit_batch))
        .route("/circulation/active", get(circulation::list_active))
        // Reports
        .route("/reports/summary", get(reports::summary))
        .with_state(state)
}
