// tests/common/mod.rs

#![allow(dead_code)]

use chrono::Utc;
use quiz_backend::{config::Config, db, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::SqlitePool;

pub const PASSWORD: &str = "Quiz-Pass-2024!";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub config: Config,
    pub client: reqwest::Client,
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        access_token_ttl: 600,
        refresh_token_ttl: 3600,
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        admin_email: None,
    }
}

/// Spawns the app on a random port over a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    // A single connection keeps every query on the same in-memory database.
    let pool = db::connect(&config.database_url, 1)
        .await
        .expect("Failed to open in-memory SQLite");

    db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        config,
        client: reqwest::Client::new(),
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_authed(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put_authed(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Registers `username` with `PASSWORD` and returns the response body.
    pub async fn register(&self, username: &str) -> Value {
        let response = self
            .post_json(
                "/auth/register/",
                &json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": PASSWORD,
                    "password2": PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "registration failed");
        response.json().await.unwrap()
    }

    /// Registers a fresh user and returns (username, access token).
    pub async fn signed_up_user(&self) -> (String, String) {
        let username = unique_name("u");
        let body = self.register(&username).await;
        let access = body["tokens"]["access"].as_str().unwrap().to_string();
        (username, access)
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/login/",
            &json!({"username": username, "password": password}),
        )
        .await
    }

    /// Inserts a question with choices straight into the store.
    /// Returns the question id and the choice ids in insertion order.
    pub async fn seed_question(
        &self,
        text: &str,
        difficulty: &str,
        choices: &[(&str, bool)],
    ) -> (i64, Vec<i64>) {
        let now = Utc::now();
        let (question_id,): (i64,) = sqlx::query_as(
            "INSERT INTO questions (text, difficulty, created_at, updated_at) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(text)
        .bind(difficulty)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .unwrap();

        let mut ids = Vec::new();
        for (choice_text, is_correct) in choices {
            let (id,): (i64,) = sqlx::query_as(
                "INSERT INTO choices (question_id, text, is_correct) VALUES (?, ?, ?) RETURNING id",
            )
            .bind(question_id)
            .bind(*choice_text)
            .bind(*is_correct)
            .fetch_one(&self.pool)
            .await
            .unwrap();
            ids.push(id);
        }

        (question_id, ids)
    }

    pub async fn practice_count(&self, username: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM practices p JOIN users u ON p.user_id = u.id WHERE u.username = ?",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .unwrap();
        count
    }

    pub async fn password_hash(&self, username: &str) -> String {
        let (hash,): (String,) = sqlx::query_as("SELECT password FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        hash
    }
}
