// src/models/session.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Session lifecycle states: `waiting` (lobby) -> `active` -> `ended`.
/// There is no transition out of `ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Ended,
}

/// Represents the 'sessions' table in the database.
/// A session is one live run of a quiz, identified by its join code.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub quiz_id: i64,

    /// Short human-entered join code; unique among non-ended sessions.
    pub code: String,

    pub status: SessionStatus,

    /// Zero-based pointer into the quiz's question sequence. The sole
    /// coordination point between clients: it only ever increases, and only
    /// while the session is active.
    pub current_question_index: i64,

    /// Server stamp of when the current question was opened, reset on every
    /// advance. Scoring derives remaining time from this.
    pub question_started_at: Option<chrono::DateTime<chrono::Utc>>,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a session.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub quiz_id: i64,
}

/// DTO for joining a session by code.
#[derive(Debug, Deserialize, Validate)]
pub struct JoinSessionRequest {
    #[validate(length(min = 1, max = 12))]
    pub code: String,
    #[validate(length(min = 1, max = 50, message = "A display name is required."))]
    pub name: String,
    pub user_id: Option<i64>,
}

/// Polling payload for `GET /sessions/{id}/status`.
/// Must stay cheap: clients poll this at sub-second intervals.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: SessionStatus,
    pub current_question_index: i64,
    pub total_questions: i64,
    pub participant_count: i64,
    /// Participants with a real (non-sentinel) answer for the current question.
    pub answered_count: i64,
    /// Non-binding signal that everyone has answered. Advancement still waits
    /// for the per-question timer so fast rounds do not shorten deliberation.
    pub all_answered: bool,
    /// Terminal regardless of `status`; clients must treat `true` as the end.
    pub is_complete: bool,
}

/// Polling payload for `GET /sessions/{id}/current-question`.
/// Carries only the present question, never the full list.
#[derive(Debug, Serialize)]
pub struct CurrentQuestionResponse {
    pub question: Option<PublicQuestion>,
    pub current_question_index: i64,
    pub total_questions: i64,
    /// Answering window in seconds, shared with the client countdown.
    pub time_limit: i64,
    /// Seconds left on the server clock; lets late pollers join mid-countdown.
    pub time_remaining: f64,
    pub is_complete: bool,
}

/// Optional body for the advance endpoint. Clients report the index their
/// countdown expired on so duplicate expiries for the same question
/// collapse into one transition.
#[derive(Debug, Default, Deserialize)]
pub struct AdvanceRequest {
    pub current_index: Option<i64>,
}

/// Outcome of a progression step (`POST /sessions/{id}/next-question`).
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub new_index: i64,
    pub total_questions: i64,
    pub is_complete: bool,
}
