// src/models/participant.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'participants' table in the database.
///
/// Display names are not unique; answer attribution always goes through the
/// participant id. Rows outlive the session they were created under so
/// history and leaderboards keep working after the session ends.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub session_id: i64,

    /// Optional link to a registered user; anonymous play leaves this unset.
    pub user_id: Option<i64>,

    pub name: String,

    /// Terminal marker set when the session ends.
    pub completed: bool,

    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// One leaderboard row, aggregated fresh from the answer ledger on every
/// request. Ordered by total_score descending, then join order.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub participant_id: i64,
    pub name: String,
    pub total_score: i64,
    pub correct_count: i64,
    /// Questions with a real answer; timed-out sentinel rows are excluded.
    pub total_answered: i64,
    /// Rounded percentage of answered questions that were correct.
    pub accuracy: i64,
}
