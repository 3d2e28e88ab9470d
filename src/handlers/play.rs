// src/handlers/play.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    engine::{answers, leaderboard, progression, sessions},
    error::AppError,
    models::{
        answer::{HistoryEntry, SubmitAnswerRequest},
        participant::Participant,
        session::{AdvanceRequest, SessionStatus},
    },
};

/// Records a participant's answer for the session's current question.
/// Unauthenticated; attribution is by participant id.
pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    Path(session_id): Path<i64>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = answers::submit_answer(
        &pool,
        session_id,
        payload.participant_id,
        payload.question_id,
        payload.answer_index,
    )
    .await?;

    Ok(Json(outcome))
}

/// Advances to the next question. Called by every client whose countdown
/// expires; the engine guarantees a single winner per transition. The body
/// is optional: clients include the index they observed, the host omits it.
pub async fn next_question(
    State(pool): State<SqlitePool>,
    Path(session_id): Path<i64>,
    payload: Option<Json<AdvanceRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let observed = payload.and_then(|Json(body)| body.current_index);
    let outcome = progression::advance(&pool, session_id, observed).await?;

    Ok(Json(outcome))
}

/// Live leaderboard, recomputed from the answer ledger on every call.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let entries = leaderboard::leaderboard(&pool, session_id).await?;

    Ok(Json(entries))
}

/// Post-game review for one participant: every answer joined with its
/// question, correct answers and explanations included.
///
/// Only available once the session has ended. Revealing correct indexes
/// mid-session would let a participant overwrite a wrong answer with the
/// right one while the question is still open.
pub async fn participant_history(
    State(pool): State<SqlitePool>,
    Path(participant_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let participant = sqlx::query_as::<_, Participant>(
        "SELECT id, session_id, user_id, name, completed, joined_at FROM participants WHERE id = ?",
    )
    .bind(participant_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Participant not found".to_string()))?;

    let session = sessions::get_by_id(&pool, participant.session_id).await?;

    if session.status != SessionStatus::Ended {
        return Err(AppError::InvalidState(
            "History is available once the session has ended".to_string(),
        ));
    }

    let quiz = sessions::get_quiz(&pool, session.quiz_id).await?;

    let entries = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT
            q.id AS question_id,
            q.question_text AS question_text,
            q.options AS options,
            q.correct_answer_index AS correct_answer_index,
            q.explanation AS explanation,
            a.answer_index AS answer_index,
            a.points AS points,
            a.time_remaining AS time_remaining
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE a.participant_id = ? AND a.session_id = ?
        ORDER BY q.order_index ASC, q.id ASC
        "#,
    )
    .bind(participant_id)
    .bind(session.id)
    .fetch_all(&pool)
    .await?;

    let total_score: i64 = entries.iter().map(|entry| entry.points).sum();

    Ok(Json(json!({
        "participant": participant,
        "quiz_title": quiz.title,
        "total_score": total_score,
        "answers": entries
    })))
}
