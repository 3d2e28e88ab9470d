// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::CreateQuestionRequest;

/// Represents the 'quizzes' table in the database.
///
/// A quiz is immutable once a session referencing it has started: this core
/// never mutates quizzes or questions, so an in-progress session's question
/// set cannot change underneath it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Per-question answering window in seconds, shared with the
    /// client-visible countdown.
    pub time_limit: i64,

    /// Optional expiry; live sessions of an expired quiz are ended by
    /// administrative cleanup.
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a quiz together with its question list.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Title must not be empty."))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 5, max = 300, message = "Time limit must be 5-300 seconds."))]
    pub time_limit: Option<i64>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    #[validate(length(min = 1, message = "A quiz needs at least one question."), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}
