// src/handlers/admin.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{engine::sessions, error::AppError};

/// Ends every live session whose quiz has passed its expiry timestamp.
/// Admin only.
pub async fn cleanup_sessions(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let ended = sessions::end_expired_sessions(&pool).await?;

    Ok(Json(json!({ "ended_sessions": ended })))
}
