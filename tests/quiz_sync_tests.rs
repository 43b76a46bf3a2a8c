// tests/quiz_sync_tests.rs
//
// Coverage of quiz authoring and the quiz/question sync transaction:
// update/insert/delete reconciliation, ordering, and all-or-nothing abort.
// Requires a running Postgres via DATABASE_URL; tests skip silently when it
// is not set.

use elearn_backend::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> Option<(String, PgPool)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("Skipping: DATABASE_URL not set");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "sync_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
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

    Some((address, pool))
}

async fn login_user(
    address: &str,
    client: &reqwest::Client,
    pool: &PgPool,
    admin: bool,
) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(response.status().as_u16(), 201);

    if admin {
        sqlx::query("UPDATE users SET role = 'admin' WHERE username = $1")
            .bind(&username)
            .execute(pool)
            .await
            .expect("Failed to promote user");
    }

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to login");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Creates a quiz with questions Q1 and Q2. Returns (quiz_id, [q1, q2]).
async fn create_two_question_quiz(
    address: &str,
    client: &reqwest::Client,
    admin_token: &str,
) -> (i64, Vec<i64>) {
    let response = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "title": "Editable quiz",
            "limit": 1,
            "duration": 300,
            "passing_grade": 60.0,
            "questions": [
                {
                    "question": "Q1 original text",
                    "point": 2.0,
                    "options": [
                        { "text": "True", "is_correct": true },
                        { "text": "False", "is_correct": false }
                    ]
                },
                {
                    "question": "Q2 original text",
                    "point": 2.0,
                    "options": [
                        { "text": "True", "is_correct": false },
                        { "text": "False", "is_correct": true }
                    ]
                }
            ]
        }))
        .send()
        .await
        .expect("Failed to create quiz");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    let quiz_id = body["id"].as_i64().unwrap();
    let question_ids: Vec<i64> = body["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(question_ids.len(), 2);

    (quiz_id, question_ids)
}

/// Question ids currently persisted for a quiz, ordered by id.
async fn persisted_question_ids(pool: &PgPool, quiz_id: i64) -> Vec<i64> {
    sqlx::query_scalar("SELECT id FROM questions WHERE quiz_id = $1 ORDER BY id")
        .bind(quiz_id)
        .fetch_all(pool)
        .await
        .unwrap()
}

/// The quiz row's own ordered `questions` list.
async fn quiz_question_list(pool: &PgPool, quiz_id: i64) -> Vec<i64> {
    let value: serde_json::Value =
        sqlx::query_scalar("SELECT questions FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .fetch_one(pool)
            .await
            .unwrap();
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn create_quiz_links_questions_in_one_pass() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let admin_token = login_user(&address, &client, &pool, true).await;
    let (quiz_id, question_ids) = create_two_question_quiz(&address, &client, &admin_token).await;

    // Every question row carries the quiz reference, and the quiz's own list
    // matches exactly.
    assert_eq!(persisted_question_ids(&pool, quiz_id).await, question_ids);
    assert_eq!(quiz_question_list(&pool, quiz_id).await, question_ids);
}

#[tokio::test]
async fn sync_updates_inserts_and_deletes() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let admin_token = login_user(&address, &client, &pool, true).await;
    let (quiz_id, question_ids) = create_two_question_quiz(&address, &client, &admin_token).await;
    let (q1, q2) = (question_ids[0], question_ids[1]);

    // Desired state: Q1 with updated text, Q3 brand new; Q2 omitted.
    let response = client
        .put(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "title": "Edited title",
            "questions": [
                {
                    "id": q1,
                    "question": "Q1 updated text",
                    "point": 3.0,
                    "options": [
                        { "text": "True", "is_correct": false },
                        { "text": "False", "is_correct": true }
                    ]
                },
                {
                    "question": "Q3 new question",
                    "point": 1.0,
                    "options": [
                        { "text": "True", "is_correct": true },
                        { "text": "False", "is_correct": false }
                    ]
                }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["success"].as_bool().unwrap());

    let kept: Vec<i64> = body["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0], q1);
    let q3 = kept[1];
    assert_ne!(q3, q2);

    // Q2 deleted, Q1 kept and updated, Q3 inserted; quiz list matches the
    // supplied order.
    let mut expected = vec![q1, q3];
    expected.sort();
    assert_eq!(persisted_question_ids(&pool, quiz_id).await, expected);
    assert_eq!(quiz_question_list(&pool, quiz_id).await, vec![q1, q3]);

    let (text, point): (String, f64) =
        sqlx::query_as("SELECT question, point FROM questions WHERE id = $1")
            .bind(q1)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(text, "Q1 updated text");
    assert_eq!(point, 3.0);

    let title: String = sqlx::query_scalar("SELECT title FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(title, "Edited title");
}

#[tokio::test]
async fn failed_sync_leaves_no_partial_mutation() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let admin_token = login_user(&address, &client, &pool, true).await;
    let (quiz_id, question_ids) = create_two_question_quiz(&address, &client, &admin_token).await;

    let before_rows = persisted_question_ids(&pool, quiz_id).await;
    let before_list = quiz_question_list(&pool, quiz_id).await;
    let before_title: String = sqlx::query_scalar("SELECT title FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .fetch_one(&pool)
        .await
        .unwrap();

    // The new question would be inserted first, then the bogus id fails the
    // transaction; nothing of either step may remain visible.
    let response = client
        .put(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "title": "Should not stick",
            "questions": [
                {
                    "question": "Orphan-to-be",
                    "point": 1.0,
                    "options": [{ "text": "True", "is_correct": true }]
                },
                {
                    "id": 99999999,
                    "question": "Does not exist",
                    "point": 1.0,
                    "options": [{ "text": "True", "is_correct": true }]
                }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    assert_eq!(persisted_question_ids(&pool, quiz_id).await, before_rows);
    assert_eq!(quiz_question_list(&pool, quiz_id).await, before_list);

    let title_after: String = sqlx::query_scalar("SELECT title FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(title_after, before_title);
    assert_eq!(question_ids.len(), 2);
}

#[tokio::test]
async fn quiz_authoring_is_admin_only() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let user_token = login_user(&address, &client, &pool, false).await;

    let response = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(&user_token)
        .json(&serde_json::json!({
            "title": "Not allowed",
            "questions": []
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}
