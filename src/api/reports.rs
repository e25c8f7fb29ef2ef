use axum::{extract::State, http::StatusCode, Json};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use super::Tenant;
use crate::services::report_service;

pub async fn summary(
    State(db): State<DatabaseConnection>,
    Tenant(tenant): Tenant,
) -> Result<Json<Value>, (StatusCode, String)> {
    let stats = report_service::library_stats(&db, tenant)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({ "stats": stats })))
}
