// src/models/answer.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'answers' table in the database: the answer ledger.
/// Keyed by (session, participant, question); resubmission overwrites.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub session_id: i64,
    pub participant_id: i64,
    pub question_id: i64,

    /// Chosen option index, or -1 for "timed out, no answer".
    pub answer_index: i64,

    /// Seconds left on the server clock when the submission arrived.
    pub time_remaining: f64,

    /// Points awarded, fixed at submission time and never recomputed.
    pub points: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting an answer.
/// Deliberately carries no client-side timing: the server computes remaining
/// time from its own stamp of when the question opened.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub participant_id: i64,
    pub question_id: i64,
    pub answer_index: i64,
}

/// Outcome of an answer submission.
#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub points: i64,
    /// False when the submission was absorbed without effect, e.g. a real
    /// answer arriving after the slot was already marked timed-out.
    pub accepted: bool,
    pub answered_count: i64,
    pub participant_count: i64,
    pub all_answered: bool,
}

/// One row of a participant's post-game review: their answer joined with the
/// question it was given for, including the fields hidden during play.
#[derive(Debug, Serialize, FromRow)]
pub struct HistoryEntry {
    pub question_id: i64,
    pub question_text: String,
    pub options: Json<Vec<String>>,
    pub correct_answer_index: i64,
    pub explanation: Option<String>,
    pub answer_index: i64,
    pub points: i64,
    pub time_remaining: f64,
}
