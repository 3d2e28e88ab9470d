// src/engine/progression.rs

//! Progression controller: decides and executes "move to the next question".
//!
//! Advancement is client-initiated. Every client runs its own countdown
//! against the reported time limit and calls advance when it hits zero, so
//! several clients (and the host) race for the same transition. The
//! compare-and-set below makes that race safe: exactly one caller moves the
//! index, everyone else observes the new index as a no-op.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    engine::sessions,
    error::AppError,
    models::session::{AdvanceResponse, SessionStatus},
};

/// Advances the session's current-question-index by exactly one.
///
/// `observed_index` is the index the caller's countdown expired on; of all
/// the calls targeting the same index, only the first performs the
/// transition. A call whose target is already superseded returns the
/// now-current index untouched. Omitting it (the host's "just advance")
/// targets whatever is current.
///
/// Moving past the last question transitions the session to `ended`. The
/// index never skips and never decrements. Callers that get `InvalidState`
/// should resynchronize by re-reading session status, not retry.
pub async fn advance(
    pool: &SqlitePool,
    session_id: i64,
    observed_index: Option<i64>,
) -> Result<AdvanceResponse, AppError> {
    let session = sessions::get_by_id(pool, session_id).await?;

    match session.status {
        SessionStatus::Waiting => {
            return Err(AppError::InvalidState(
                "Session has not started".to_string(),
            ));
        }
        SessionStatus::Ended => {
            return Err(AppError::InvalidState(
                "Session has already ended".to_string(),
            ));
        }
        SessionStatus::Active => {}
    }

    let total = sessions::question_count(pool, session.quiz_id).await?;
    let current = session.current_question_index;

    if let Some(observed) = observed_index {
        if observed != current {
            // A duplicate expiry for a question someone else already moved
            // past; absorb it.
            return Ok(AdvanceResponse {
                new_index: current,
                total_questions: total,
                is_complete: current >= total,
            });
        }
    }

    let target = current + 1;

    // Compare-and-set on the question index: the update only applies if the
    // index still holds the value this caller saw.
    let done = sqlx::query(
        r#"
        UPDATE sessions
        SET current_question_index = ?, question_started_at = ?
        WHERE id = ? AND status = 'active' AND current_question_index = ?
        "#,
    )
    .bind(target)
    .bind(Utc::now())
    .bind(session_id)
    .bind(current)
    .execute(pool)
    .await?;

    if done.rows_affected() == 0 {
        // Another caller advanced (or ended) the session first. Report the
        // now-current index instead of moving it again.
        let latest = sessions::get_by_id(pool, session_id).await?;
        return Ok(AdvanceResponse {
            new_index: latest.current_question_index,
            total_questions: total,
            is_complete: latest.status == SessionStatus::Ended
                || latest.current_question_index >= total,
        });
    }

    let is_complete = target >= total;
    if is_complete {
        sessions::finish_session(pool, session_id).await?;
    }

    Ok(AdvanceResponse {
        new_index: target,
        total_questions: total,
        is_complete,
    })
}
