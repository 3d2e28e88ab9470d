// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// The text content of the question.
    pub question_text: String,

    /// Ordered list of answer options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// Index into `options` of the correct answer.
    pub correct_answer_index: i64,

    /// Display point value of the question.
    pub points: i64,

    /// Optional hint shown to participants on request.
    pub hint: Option<String>,

    /// Optional explanation revealed during post-game review.
    pub explanation: Option<String>,

    /// Stable ordering key within the quiz.
    pub order_index: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending the current question to participants.
/// Excludes the correct answer index and explanation so polling clients
/// cannot score-cheat or look ahead.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub options: Json<Vec<String>>,
    pub points: i64,
    pub hint: Option<String>,
    pub order_index: i64,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            question_text: q.question_text,
            options: q.options,
            points: q.points,
            hint: q.hint,
            order_index: q.order_index,
        }
    }
}

/// DTO for creating a new question as part of a quiz.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_correct_index))]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    pub correct_answer_index: i64,
    #[validate(range(min = 1, max = 10000))]
    pub points: Option<i64>,
    #[validate(length(max = 500))]
    pub hint: Option<String>,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_options"));
    }
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("option_length"));
        }
    }
    Ok(())
}

fn validate_correct_index(req: &CreateQuestionRequest) -> Result<(), validator::ValidationError> {
    if req.correct_answer_index < 0 || req.correct_answer_index as usize >= req.options.len() {
        return Err(validator::ValidationError::new(
            "correct_answer_index_out_of_bounds",
        ));
    }
    Ok(())
}
