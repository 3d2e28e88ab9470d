// src/handlers/profile.rs

use axum::{Json, extract::{Extension, State}, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{error::AppError, utils::jwt::Claims};

/// Aggregated statistics for the authenticated user's profile page.
///
/// Hosts see how many quizzes they created; players see how many sessions
/// they played and their overall accuracy, derived from their linked
/// participant rows.
pub async fn stats(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    if claims.role == "admin" {
        let quizzes_created =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quizzes WHERE owner_id = ?")
                .bind(user_id)
                .fetch_one(&pool)
                .await?;

        return Ok(Json(json!({ "quizzes_created": quizzes_created })));
    }

    let sessions_played =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM participants WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&pool)
            .await?;

    let total_answers = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM answers a
        JOIN participants p ON p.id = a.participant_id
        WHERE p.user_id = ? AND a.answer_index >= 0
        "#,
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    let correct_answers = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM answers a
        JOIN participants p ON p.id = a.participant_id
        WHERE p.user_id = ? AND a.points > 0
        "#,
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    let accuracy = if total_answers > 0 {
        (correct_answers as f64 / total_answers as f64 * 100.0).round() as i64
    } else {
        0
    };

    Ok(Json(json!({
        "sessions_played": sessions_played,
        "total_answers": total_answers,
        "accuracy": accuracy
    })))
}
