// src/engine/leaderboard.rs

//! Leaderboard aggregator: derives per-participant totals from the answer
//! ledger on every request. Nothing is cached, so a corrected answer row is
//! reflected on the next poll without any reconciliation step.

use sqlx::{SqlitePool, prelude::FromRow};

use crate::{engine::sessions, error::AppError, models::participant::LeaderboardEntry};

#[derive(Debug, FromRow)]
struct LeaderboardRow {
    participant_id: i64,
    name: String,
    total_score: i64,
    correct_count: i64,
    total_answered: i64,
}

/// Scores for every participant of the session, highest first.
///
/// A row counts as correct when it earned points. Ties on total score break
/// by join order (earliest joiner first), which keeps the ordering stable
/// across polls.
pub async fn leaderboard(
    pool: &SqlitePool,
    session_id: i64,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    // a bogus session id is a 404, not an empty board
    sessions::get_by_id(pool, session_id).await?;

    let rows = sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT
            p.id AS participant_id,
            p.name AS name,
            COALESCE(SUM(a.points), 0) AS total_score,
            COUNT(CASE WHEN a.points > 0 THEN 1 END) AS correct_count,
            COUNT(CASE WHEN a.answer_index >= 0 THEN 1 END) AS total_answered
        FROM participants p
        LEFT JOIN answers a
            ON a.participant_id = p.id AND a.session_id = p.session_id
        WHERE p.session_id = ?
        GROUP BY p.id, p.name
        ORDER BY total_score DESC, p.joined_at ASC, p.id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to aggregate leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let entries = rows
        .into_iter()
        .map(|row| {
            let accuracy = if row.total_answered > 0 {
                (row.correct_count as f64 / row.total_answered as f64 * 100.0).round() as i64
            } else {
                0
            };

            LeaderboardEntry {
                participant_id: row.participant_id,
                name: row.name,
                total_score: row.total_score,
                correct_count: row.correct_count,
                total_answered: row.total_answered,
                accuracy,
            }
        })
        .collect();

    Ok(entries)
}
