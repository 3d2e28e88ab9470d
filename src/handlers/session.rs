// src/handlers/session.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    engine::sessions,
    error::AppError,
    models::session::{CreateSessionRequest, JoinSessionRequest},
    utils::jwt::Claims,
};

/// Creates a session for one of the host's own quizzes.
/// The session starts in `waiting` with a fresh join code.
pub async fn create(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let host_id = claims.user_id()?;
    let session = sessions::create_session(&pool, payload.quiz_id, host_id).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Live-session lookup for the join screen.
pub async fn get_by_code(
    State(pool): State<SqlitePool>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions::get_by_code(&pool, &code).await?;

    Ok(Json(session))
}

/// Joins a session by code. Deliberately unauthenticated: anonymous play
/// only needs a display name.
pub async fn join(
    State(pool): State<SqlitePool>,
    Json(payload): Json<JoinSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let participant =
        sessions::join_session(&pool, &payload.code, &payload.name, payload.user_id).await?;

    Ok((StatusCode::CREATED, Json(participant)))
}

/// Host-only: `waiting -> active`.
pub async fn start(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let host_id = claims.user_id()?;
    let session = sessions::start_session(&pool, session_id, host_id).await?;

    Ok(Json(session))
}

/// Host-only: explicit `active -> ended`.
pub async fn end(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let host_id = claims.user_id()?;
    let session = sessions::end_session(&pool, session_id, host_id).await?;

    Ok(Json(session))
}

/// Status polling endpoint; see the synchronization contract in the engine.
pub async fn status(
    State(pool): State<SqlitePool>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let status = sessions::session_status(&pool, session_id).await?;

    Ok(Json(status))
}

/// Current-question polling endpoint.
pub async fn current_question(
    State(pool): State<SqlitePool>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let current = sessions::current_question(&pool, session_id).await?;

    Ok(Json(current))
}
