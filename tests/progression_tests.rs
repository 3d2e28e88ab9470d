// tests/progression_tests.rs

use quizburst::{config::Config, routes, state::AppState};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "progression_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Registers a host, creates a quiz with `question_count` questions, opens a
/// session and joins one participant. Returns (session id, participant id).
async fn seed_game(
    client: &reqwest::Client,
    address: &str,
    question_count: usize,
) -> (i64, i64, String) {
    let email = format!("host_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Register failed");

    let login = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();

    let questions: Vec<serde_json::Value> = (0..question_count)
        .map(|i| {
            serde_json::json!({
                "question_text": format!("Question {}", i),
                "options": ["A", "B"],
                "correct_answer_index": 0
            })
        })
        .collect();

    let quiz: serde_json::Value = client
        .post(&format!("{}/api/quizzes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "title": "Progression quiz", "questions": questions }))
        .send()
        .await
        .expect("Create quiz failed")
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_i64().unwrap();

    let session: serde_json::Value = client
        .post(&format!("{}/api/sessions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "quiz_id": quiz_id }))
        .send()
        .await
        .expect("Create session failed")
        .json()
        .await
        .unwrap();
    let session_id = session["id"].as_i64().unwrap();
    let code = session["code"].as_str().unwrap().to_string();

    let participant: serde_json::Value = client
        .post(&format!("{}/api/sessions/join", address))
        .json(&serde_json::json!({ "code": code, "name": "Ada" }))
        .send()
        .await
        .expect("Join failed")
        .json()
        .await
        .unwrap();
    let participant_id = participant["id"].as_i64().unwrap();

    (session_id, participant_id, token)
}

async fn start(client: &reqwest::Client, address: &str, token: &str, session_id: i64) {
    let response = client
        .post(&format!("{}/api/sessions/{}/start", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Start failed");
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn concurrent_advance_has_exactly_one_winner() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (session_id, _participant, token) = seed_game(&client, &address, 2).await;
    start(&client, &address, &token, session_id).await;

    // Two clients whose countdowns expire at the same moment both call
    // advance for index 0
    let url = format!("{}/api/sessions/{}/next-question", address, session_id);
    let body = serde_json::json!({ "current_index": 0 });
    let (a, b) = tokio::join!(
        client.post(&url).json(&body).send(),
        client.post(&url).json(&body).send()
    );

    let a: serde_json::Value = a.unwrap().json().await.unwrap();
    let b: serde_json::Value = b.unwrap().json().await.unwrap();

    // Exactly one performs the transition; the other observes index 1 as a
    // no-op. Neither ever reports index 2.
    assert_eq!(a["new_index"].as_i64().unwrap(), 1);
    assert_eq!(b["new_index"].as_i64().unwrap(), 1);
    assert_eq!(a["is_complete"], false);
    assert_eq!(b["is_complete"], false);

    let status: serde_json::Value = client
        .get(&format!("{}/api/sessions/{}/status", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["current_question_index"].as_i64().unwrap(), 1);
    assert_eq!(status["status"], "active");
}

#[tokio::test]
async fn advance_rejects_waiting_session() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (session_id, _participant, _token) = seed_game(&client, &address, 2).await;

    let response = client
        .post(&format!("{}/api/sessions/{}/next-question", address, session_id))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn advance_past_last_question_ends_the_session() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (session_id, participant_id, token) = seed_game(&client, &address, 1).await;
    start(&client, &address, &token, session_id).await;

    let advanced: serde_json::Value = client
        .post(&format!("{}/api/sessions/{}/next-question", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(advanced["new_index"].as_i64().unwrap(), 1);
    assert_eq!(advanced["total_questions"].as_i64().unwrap(), 1);
    assert_eq!(advanced["is_complete"], true);

    let status: serde_json::Value = client
        .get(&format!("{}/api/sessions/{}/status", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["status"], "ended");
    assert_eq!(status["is_complete"], true);

    // Participants carry their terminal marker once the session ends
    let completed = sqlx::query_scalar::<_, bool>("SELECT completed FROM participants WHERE id = ?")
        .bind(participant_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(completed);

    // No transition out of `ended`: further advances are invalid
    let again = client
        .post(&format!("{}/api/sessions/{}/next-question", address, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);
}

#[tokio::test]
async fn restarting_an_active_session_is_rejected() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (session_id, _participant, token) = seed_game(&client, &address, 1).await;
    start(&client, &address, &token, session_id).await;

    let response = client
        .post(&format!("{}/api/sessions/{}/start", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn stale_question_submissions_are_rejected_after_advance() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (session_id, participant_id, token) = seed_game(&client, &address, 2).await;
    start(&client, &address, &token, session_id).await;

    let first_question: serde_json::Value = client
        .get(&format!("{}/api/sessions/{}/current-question", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let stale_id = first_question["question"]["id"].as_i64().unwrap();

    client
        .post(&format!("{}/api/sessions/{}/next-question", address, session_id))
        .send()
        .await
        .unwrap();

    // A submission racing the advancement targets a superseded question
    let late = client
        .post(&format!("{}/api/sessions/{}/submit-answer", address, session_id))
        .json(&serde_json::json!({
            "participant_id": participant_id,
            "question_id": stale_id,
            "answer_index": 0
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(late.status().as_u16(), 409);
}

#[tokio::test]
async fn host_can_end_an_active_session_early() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (session_id, _participant, token) = seed_game(&client, &address, 3).await;
    start(&client, &address, &token, session_id).await;

    let ended: serde_json::Value = client
        .post(&format!("{}/api/sessions/{}/end", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ended["status"], "ended");

    // Ending a session that is not active is an invalid transition
    let again = client
        .post(&format!("{}/api/sessions/{}/end", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);
}
