// src/engine/sessions.rs

//! Session state machine: `waiting` -> `active` -> `ended`, plus the read
//! surface that polling clients observe between transitions.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    engine::answers,
    error::AppError,
    models::{
        participant::Participant,
        question::Question,
        quiz::Quiz,
        session::{CurrentQuestionResponse, Session, SessionStatus, StatusResponse},
    },
    utils::join_code::generate_join_code,
};

/// Attempts before giving up on finding a free join code.
const MAX_CODE_ATTEMPTS: u32 = 16;

pub async fn get_by_id(pool: &SqlitePool, session_id: i64) -> Result<Session, AppError> {
    sqlx::query_as::<_, Session>(
        r#"
        SELECT id, quiz_id, code, status, current_question_index,
               question_started_at, created_at, started_at, ended_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Session not found".to_string()))
}

/// Looks up a live (non-ended) session by its join code.
/// Codes are generated uppercase; lookups are case-insensitive.
pub async fn get_by_code(pool: &SqlitePool, code: &str) -> Result<Session, AppError> {
    let code = code.trim().to_uppercase();

    sqlx::query_as::<_, Session>(
        r#"
        SELECT id, quiz_id, code, status, current_question_index,
               question_started_at, created_at, started_at, ended_at
        FROM sessions
        WHERE code = ? AND status != 'ended'
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Session not found".to_string()))
}

pub(crate) async fn get_quiz(pool: &SqlitePool, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, owner_id, title, description, time_limit, expires_at, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// The question at a zero-based position in the quiz's stable order.
pub(crate) async fn question_at(
    pool: &SqlitePool,
    quiz_id: i64,
    index: i64,
) -> Result<Option<Question>, AppError> {
    if index < 0 {
        return Ok(None);
    }

    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, options, correct_answer_index,
               points, hint, explanation, order_index, created_at
        FROM questions
        WHERE quiz_id = ?
        ORDER BY order_index ASC, id ASC
        LIMIT 1 OFFSET ?
        "#,
    )
    .bind(quiz_id)
    .bind(index)
    .fetch_optional(pool)
    .await?;

    Ok(question)
}

pub(crate) async fn question_count(pool: &SqlitePool, quiz_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE quiz_id = ?")
        .bind(quiz_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub(crate) async fn participant_count(pool: &SqlitePool, session_id: i64) -> Result<i64, AppError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM participants WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Creates a session in `waiting` with a freshly generated join code.
///
/// The code must be unique among non-ended sessions; generation retries on
/// collision, and the partial unique index catches the race where two
/// creations draw the same code at once.
pub async fn create_session(
    pool: &SqlitePool,
    quiz_id: i64,
    host_id: i64,
) -> Result<Session, AppError> {
    let quiz = get_quiz(pool, quiz_id).await?;

    if quiz.owner_id != host_id {
        return Err(AppError::Unauthorized(
            "Only the quiz owner can host a session".to_string(),
        ));
    }

    if let Some(expires_at) = quiz.expires_at {
        if expires_at <= Utc::now() {
            return Err(AppError::InvalidState("Quiz has expired".to_string()));
        }
    }

    let now = Utc::now();

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_join_code();

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM sessions WHERE code = ? AND status != 'ended'",
        )
        .bind(&code)
        .fetch_optional(pool)
        .await?;

        if taken.is_some() {
            continue;
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO sessions (quiz_id, code, status, current_question_index, created_at)
            VALUES (?, ?, 'waiting', 0, ?)
            "#,
        )
        .bind(quiz.id)
        .bind(&code)
        .bind(now)
        .execute(pool)
        .await;

        match inserted {
            Ok(done) => return get_by_id(pool, done.last_insert_rowid()).await,
            // lost the code to a concurrent creation; draw another
            Err(e) if e.to_string().contains("UNIQUE constraint") => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::InternalServerError(
        "Could not allocate a unique join code".to_string(),
    ))
}

/// Host-triggered `waiting -> active` transition.
///
/// Requires at least one joined participant. The update is conditioned on
/// `status = 'waiting'` so a doubled start request produces one winner.
pub async fn start_session(
    pool: &SqlitePool,
    session_id: i64,
    host_id: i64,
) -> Result<Session, AppError> {
    let session = get_by_id(pool, session_id).await?;
    let quiz = get_quiz(pool, session.quiz_id).await?;

    if quiz.owner_id != host_id {
        return Err(AppError::Unauthorized(
            "Only the quiz owner can start the session".to_string(),
        ));
    }

    if session.status != SessionStatus::Waiting {
        return Err(AppError::InvalidTransition(
            "Session has already started".to_string(),
        ));
    }

    if participant_count(pool, session_id).await? == 0 {
        return Err(AppError::NoParticipants);
    }

    let now = Utc::now();
    let done = sqlx::query(
        r#"
        UPDATE sessions
        SET status = 'active', started_at = ?, question_started_at = ?,
            current_question_index = 0
        WHERE id = ? AND status = 'waiting'
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(session_id)
    .execute(pool)
    .await?;

    if done.rows_affected() == 0 {
        return Err(AppError::InvalidTransition(
            "Session has already started".to_string(),
        ));
    }

    get_by_id(pool, session_id).await
}

/// Explicit host `active -> ended` transition.
pub async fn end_session(
    pool: &SqlitePool,
    session_id: i64,
    host_id: i64,
) -> Result<Session, AppError> {
    let session = get_by_id(pool, session_id).await?;
    let quiz = get_quiz(pool, session.quiz_id).await?;

    if quiz.owner_id != host_id {
        return Err(AppError::Unauthorized(
            "Only the quiz owner can end the session".to_string(),
        ));
    }

    if session.status != SessionStatus::Active {
        return Err(AppError::InvalidTransition(
            "Only an active session can be ended".to_string(),
        ));
    }

    finish_session(pool, session_id).await?;

    get_by_id(pool, session_id).await
}

/// Terminal transition shared by the host action, the progression
/// controller, and cleanup. Conditioned on `status = 'active'` so
/// concurrent finishers collapse to one; participants get their terminal
/// marker only when the transition actually happens.
pub(crate) async fn finish_session(pool: &SqlitePool, session_id: i64) -> Result<(), AppError> {
    let done = sqlx::query(
        "UPDATE sessions SET status = 'ended', ended_at = ? WHERE id = ? AND status = 'active'",
    )
    .bind(Utc::now())
    .bind(session_id)
    .execute(pool)
    .await?;

    if done.rows_affected() > 0 {
        sqlx::query("UPDATE participants SET completed = 1 WHERE session_id = ?")
            .bind(session_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Adds a participant to a live session. Display name collisions are
/// allowed; the returned row's id is the participant's identity from here on.
pub async fn join_session(
    pool: &SqlitePool,
    code: &str,
    name: &str,
    user_id: Option<i64>,
) -> Result<Participant, AppError> {
    let session = get_by_code(pool, code).await?;

    let done = sqlx::query(
        r#"
        INSERT INTO participants (session_id, user_id, name, completed, joined_at)
        VALUES (?, ?, ?, 0, ?)
        "#,
    )
    .bind(session.id)
    .bind(user_id)
    .bind(name)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let participant = sqlx::query_as::<_, Participant>(
        "SELECT id, session_id, user_id, name, completed, joined_at FROM participants WHERE id = ?",
    )
    .bind(done.last_insert_rowid())
    .fetch_one(pool)
    .await?;

    Ok(participant)
}

/// The cheap polling read: lifecycle state, the question pointer, and the
/// non-binding all-answered signal.
pub async fn session_status(
    pool: &SqlitePool,
    session_id: i64,
) -> Result<StatusResponse, AppError> {
    let session = get_by_id(pool, session_id).await?;
    let total = question_count(pool, session.quiz_id).await?;
    let participants = participant_count(pool, session_id).await?;

    let answered = if session.status == SessionStatus::Active {
        match question_at(pool, session.quiz_id, session.current_question_index).await? {
            Some(question) => answers::count_answered(pool, session_id, question.id).await?,
            None => 0,
        }
    } else {
        0
    };

    Ok(StatusResponse {
        status: session.status,
        current_question_index: session.current_question_index,
        total_questions: total,
        participant_count: participants,
        answered_count: answered,
        all_answered: participants > 0 && answered >= participants,
        is_complete: session.status == SessionStatus::Ended
            || session.current_question_index >= total,
    })
}

/// The present question only, never the full list. `ended` sessions still
/// report index and completion so late pollers detect the end gracefully.
pub async fn current_question(
    pool: &SqlitePool,
    session_id: i64,
) -> Result<CurrentQuestionResponse, AppError> {
    let session = get_by_id(pool, session_id).await?;

    if session.status == SessionStatus::Waiting {
        return Err(AppError::InvalidState(
            "Session has not started".to_string(),
        ));
    }

    let quiz = get_quiz(pool, session.quiz_id).await?;
    let total = question_count(pool, session.quiz_id).await?;
    let index = session.current_question_index;

    if session.status == SessionStatus::Ended || index >= total {
        return Ok(CurrentQuestionResponse {
            question: None,
            current_question_index: index,
            total_questions: total,
            time_limit: quiz.time_limit,
            time_remaining: 0.0,
            is_complete: true,
        });
    }

    let question = question_at(pool, session.quiz_id, index)
        .await?
        .ok_or(AppError::NotFound(
            "No question at the current index".to_string(),
        ))?;

    let time_remaining = session
        .question_started_at
        .map(|started| answers::remaining_seconds(started, quiz.time_limit))
        .unwrap_or(0.0);

    Ok(CurrentQuestionResponse {
        question: Some(question.into()),
        current_question_index: index,
        total_questions: total,
        time_limit: quiz.time_limit,
        time_remaining,
        is_complete: false,
    })
}

/// Administrative cleanup: ends every live session whose quiz has passed
/// its expiry. Returns how many sessions were closed.
pub async fn end_expired_sessions(pool: &SqlitePool) -> Result<u64, AppError> {
    let now = Utc::now();

    let expired = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT s.id
        FROM sessions s
        JOIN quizzes q ON q.id = s.quiz_id
        WHERE s.status != 'ended' AND q.expires_at IS NOT NULL AND q.expires_at <= ?
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    if expired.is_empty() {
        return Ok(0);
    }

    let mut update_sessions =
        QueryBuilder::<Sqlite>::new("UPDATE sessions SET status = 'ended', ended_at = ");
    update_sessions.push_bind(now);
    update_sessions.push(" WHERE id IN (");
    let mut separated = update_sessions.separated(",");
    for id in &expired {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    update_sessions.build().execute(pool).await?;

    let mut update_participants =
        QueryBuilder::<Sqlite>::new("UPDATE participants SET completed = 1 WHERE session_id IN (");
    let mut separated = update_participants.separated(",");
    for id in &expired {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    update_participants.build().execute(pool).await?;

    tracing::info!("Cleanup ended {} expired session(s)", expired.len());

    Ok(expired.len() as u64)
}
