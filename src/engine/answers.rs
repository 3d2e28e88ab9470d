// src/engine/answers.rs

//! Answer ledger: one logically-current answer per
//! (session, participant, question), recorded idempotently.
//!
//! Scoring is computed here, server-side, from the session's own stamp of
//! when the question opened. Client-reported timing never enters the
//! formula, so a client cannot misreport remaining time to inflate points.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    engine::sessions,
    error::AppError,
    models::{answer::SubmitAnswerResponse, participant::Participant, session::SessionStatus},
};

/// Flat score for any correct answer.
pub const BASE_POINTS: f64 = 30.0;

/// Extra points scaled by the fraction of the answering window left.
pub const TIME_BONUS: f64 = 70.0;

/// Sentinel answer index marking "timed out, no answer". Occupies the
/// uniqueness slot but is excluded from answered counts.
pub const TIMED_OUT_ANSWER: i64 = -1;

/// Seconds left on the server clock, clamped into the answering window.
pub(crate) fn remaining_seconds(question_started_at: DateTime<Utc>, time_limit: i64) -> f64 {
    let elapsed = (Utc::now() - question_started_at).num_milliseconds() as f64 / 1000.0;
    (time_limit as f64 - elapsed).clamp(0.0, time_limit as f64)
}

/// Monotonic time-bonus formula: a flat base plus a bonus that decays
/// linearly over the answering window. Deterministic given remaining time.
fn score(time_remaining: f64, time_limit: i64) -> i64 {
    (BASE_POINTS + time_remaining / time_limit as f64 * TIME_BONUS).round() as i64
}

/// Distinct participants with a real answer for the question. Drives the
/// all-answered signal; sentinel rows do not count.
pub async fn count_answered(
    pool: &SqlitePool,
    session_id: i64,
    question_id: i64,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM answers
        WHERE session_id = ? AND question_id = ? AND answer_index >= 0
        "#,
    )
    .bind(session_id)
    .bind(question_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Records an answer for the session's current question.
///
/// Upserts on (session, participant, question): a retried or revised
/// submission overwrites the previous row instead of duplicating it, so a
/// slow client can never double-count toward the all-answered tally. The
/// one exception is a slot already marked timed-out; a real answer arriving
/// after that is absorbed with `accepted: false`.
pub async fn submit_answer(
    pool: &SqlitePool,
    session_id: i64,
    participant_id: i64,
    question_id: i64,
    answer_index: i64,
) -> Result<SubmitAnswerResponse, AppError> {
    let session = sessions::get_by_id(pool, session_id).await?;

    if session.status != SessionStatus::Active {
        return Err(AppError::InvalidState(
            "Session is not accepting answers".to_string(),
        ));
    }

    let participant = sqlx::query_as::<_, Participant>(
        "SELECT id, session_id, user_id, name, completed, joined_at FROM participants WHERE id = ?",
    )
    .bind(participant_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Participant not found".to_string()))?;

    if participant.session_id != session_id {
        return Err(AppError::NotFound(
            "Participant did not join this session".to_string(),
        ));
    }

    let question = sessions::question_at(pool, session.quiz_id, session.current_question_index)
        .await?
        .ok_or(AppError::InvalidState(
            "No question is currently open".to_string(),
        ))?;

    if question.id != question_id {
        // stale submission racing an advancement; staleness is bounded to
        // one question by this check
        return Err(AppError::InvalidState(
            "Question is no longer current".to_string(),
        ));
    }

    if answer_index < TIMED_OUT_ANSWER || answer_index >= question.options.len() as i64 {
        return Err(AppError::BadRequest(
            "Answer index out of range".to_string(),
        ));
    }

    let quiz = sessions::get_quiz(pool, session.quiz_id).await?;
    let started_at = session
        .question_started_at
        .ok_or(AppError::InvalidState(
            "Question timer has not started".to_string(),
        ))?;

    let time_remaining = remaining_seconds(started_at, quiz.time_limit);
    let correct = answer_index >= 0 && answer_index == question.correct_answer_index;
    let points = if correct {
        score(time_remaining, quiz.time_limit)
    } else {
        0
    };

    let previous = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT answer_index
        FROM answers
        WHERE session_id = ? AND participant_id = ? AND question_id = ?
        "#,
    )
    .bind(session_id)
    .bind(participant_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    let accepted = !(previous == Some(TIMED_OUT_ANSWER) && answer_index != TIMED_OUT_ANSWER);

    if accepted {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO answers
                (session_id, participant_id, question_id, answer_index,
                 time_remaining, points, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (session_id, participant_id, question_id) DO UPDATE SET
                answer_index = excluded.answer_index,
                time_remaining = excluded.time_remaining,
                points = excluded.points,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(participant_id)
        .bind(question_id)
        .bind(answer_index)
        .bind(time_remaining)
        .bind(points)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert answer: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    let answered_count = count_answered(pool, session_id, question.id).await?;
    let participant_count = sessions::participant_count(pool, session_id).await?;

    Ok(SubmitAnswerResponse {
        points: if accepted { points } else { 0 },
        accepted,
        answered_count,
        participant_count,
        all_answered: participant_count > 0 && answered_count >= participant_count,
    })
}
