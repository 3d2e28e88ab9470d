// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, play, profile, quiz, session},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, profile, quizzes, sessions, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
///
/// Polling endpoints (status, current-question) and play endpoints (join,
/// submit-answer, next-question, leaderboard) are deliberately
/// unauthenticated to support anonymous play; host and authoring routes sit
/// behind the JWT middleware.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:5173".parse().unwrap(),
        "http://127.0.0.1:5173".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let profile_routes = Router::new()
        .route("/stats", get(profile::stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/", post(quiz::create_quiz).get(quiz::list_quizzes))
        .route("/{id}/questions", get(quiz::list_questions))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let session_routes = Router::new()
        .route("/code/{code}", get(session::get_by_code))
        .route("/join", post(session::join))
        .route("/{id}/status", get(session::status))
        .route("/{id}/current-question", get(session::current_question))
        .route("/{id}/submit-answer", post(play::submit_answer))
        .route("/{id}/next-question", post(play::next_question))
        .route("/{id}/leaderboard", get(play::get_leaderboard))
        // Host-restricted session routes
        .merge(
            Router::new()
                .route("/", post(session::create))
                .route("/{id}/start", post(session::start))
                .route("/{id}/end", post(session::end))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let participant_routes = Router::new().route("/{id}/history", get(play::participant_history));

    let admin_routes = Router::new()
        .route("/sessions/cleanup", post(admin::cleanup_sessions))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/sessions", session_routes)
        .nest("/api/participants", participant_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
