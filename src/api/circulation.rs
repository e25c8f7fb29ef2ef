use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Tenant;
use crate::domain::{CirculationMode, IssueOutcome, ReturnOutcome};
use crate::infrastructure::AppState;
use crate::services::report_service;

/// Default loan duration; the UI offers presets but the engine accepts any
/// positive value.
const DEFAULT_LOAN_DAYS: u32 = 14;

#[derive(Deserialize)]
pub struct IssueRequest {
    pub isbn: String,
    pub student_number: String,
    pub duration_days: Option<u32>,
}

pub async fn issue_book(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Json(payload): Json<IssueRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let outcome = state
        .engine
        .issue_book(
            tenant,
            payload.isbn.trim(),
            payload.student_number.trim(),
            payload.duration_days.unwrap_or(DEFAULT_LOAN_DAYS),
        )
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    // Business refusals stay 200: they are results the scanning desk shows,
    // not transport errors.
    match outcome {
        IssueOutcome::Issued {
            transaction_id,
            ref warning,
        } => Ok(Json(json!({
            "success": true,
            "message": outcome.message(),
            "warning": warning,
            "transaction_id": transaction_id
        }))),
        _ => Ok(Json(json!({
            "success": false,
            "message": outcome.message()
        }))),
    }
}

#[derive(Deserialize)]
pub struct ReturnRequest {
    pub isbn: String,
}

pub async fn return_book(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Json(payload): Json<ReturnRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let outcome = state
        .engine
        .return_book(tenant, payload.isbn.trim())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match outcome {
        ReturnOutcome::Returned { transaction_id } => Ok(Json(json!({
            "success": true,
            "message": outcome.message(),
            "transaction_id": transaction_id
        }))),
        _ => Ok(Json(json!({
            "success": false,
            "message": outcome.message()
        }))),
    }
}

#[derive(Deserialize)]
pub struct CheckQuery {
    pub isbn: String,
    pub student_number: Option<String>,
}

/// Pre-flight probe for live scan feedback; never mutates state.
pub async fn check_book(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Query(query): Query<CheckQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let verdict = state
        .engine
        .check_book_for_student(tenant, query.isbn.trim(), query.student_number.as_deref())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({
        "valid": verdict.is_valid(),
        "verdict": verdict,
        "message": verdict.message()
    })))
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub mode: CirculationMode,
    pub student_number: Option<String>,
    pub isbns: Vec<String>,
    pub duration_days: Option<u32>,
}

pub async fn commit_batch(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Json(payload): Json<BatchRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if payload.isbns.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Taranmış kitap listesi boş.".to_string(),
        ));
    }
    if payload.mode == CirculationMode::Issue && payload.student_number.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Ödünç işlemi için öğrenci numarası gerekli.".to_string(),
        ));
    }

    // Batch set semantics: one attempt per token, scan order preserved
    let mut tokens: Vec<String> = Vec::with_capacity(payload.isbns.len());
    for isbn in &payload.isbns {
        let isbn = isbn.trim();
        if !isbn.is_empty() && !tokens.iter().any(|t| t == isbn) {
            tokens.push(isbn.to_string());
        }
    }

    let report = state
        .engine
        .commit_batch(
            tenant,
            payload.mode,
            payload.student_number.as_deref(),
            &tokens,
            payload.duration_days.unwrap_or(DEFAULT_LOAN_DAYS),
        )
        .await;

    Ok(Json(json!({
        "successes": report.successes,
        "failures": report.failures,
        "success_count": report.success_count(),
        "failure_count": report.failure_count(),
        "clean": report.is_clean(),
        "summary": report.summary(payload.mode)
    })))
}

pub async fn list_active(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
) -> Result<Json<Value>, (StatusCode, String)> {
    let loans = report_service::list_active_loans(state.db(), tenant)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({ "loans": loans })))
}
