// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{question::Question, quiz::{CreateQuizRequest, Quiz}},
    utils::jwt::Claims,
};

/// Default per-question answering window when the host does not set one.
const DEFAULT_TIME_LIMIT: i64 = 20;

/// Default display point value for a question.
const DEFAULT_POINTS: i64 = 100;

/// Creates a quiz together with its ordered question list.
///
/// Questions are validated at ingestion (at least two options, correct
/// index in bounds) and written in one transaction so a quiz never exists
/// half-populated. Their order_index is assigned from the submitted order
/// and is the only ordering key from here on.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let owner_id = claims.user_id()?;
    let now = chrono::Utc::now();

    let mut tx = pool.begin().await?;

    let quiz_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quizzes (owner_id, title, description, time_limit, expires_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(owner_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.time_limit.unwrap_or(DEFAULT_TIME_LIMIT))
    .bind(payload.expires_at)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for (index, question) in payload.questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO questions
                (quiz_id, question_text, options, correct_answer_index,
                 points, hint, explanation, order_index, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(quiz_id)
        .bind(&question.question_text)
        .bind(sqlx::types::Json(&question.options))
        .bind(question.correct_answer_index)
        .bind(question.points.unwrap_or(DEFAULT_POINTS))
        .bind(&question.hint)
        .bind(&question.explanation)
        .bind(index as i64)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit quiz creation: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": quiz_id,
            "question_count": payload.questions.len()
        })),
    ))
}

/// Lists the authenticated host's own quizzes, newest first.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.user_id()?;

    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, owner_id, title, description, time_limit, expires_at, created_at
        FROM quizzes
        WHERE owner_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(quizzes))
}

/// Full question list for a quiz, correct answers included.
/// Authoring view, so only the owner may read it.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = sqlx::query_scalar::<_, i64>("SELECT owner_id FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if owner_id != claims.user_id()? {
        return Err(AppError::Unauthorized(
            "Only the quiz owner can view its questions".to_string(),
        ));
    }

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, options, correct_answer_index,
               points, hint, explanation, order_index, created_at
        FROM questions
        WHERE quiz_id = ?
        ORDER BY order_index ASC, id ASC
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(questions))
}
