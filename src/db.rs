// src/db.rs

use std::{str::FromStr, time::Duration};

use chrono::Utc;
use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{config::Config, error::AppError, utils::hash::hash_password};

/// Embedded schema migrations from `./migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens a pool, creating the database file if needed.
/// Foreign keys are enforced so cascades work.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        // An in-memory database lives only as long as its connection.
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
}

/// Creates the configured staff account unless that username already exists.
/// Returns whether a user was inserted.
pub async fn seed_admin_user(pool: &SqlitePool, config: &Config) -> Result<bool, AppError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(false);
    };

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if exists.is_some() {
        return Ok(false);
    }

    tracing::info!("Seeding admin user: {}", username);
    let email = config
        .admin_email
        .clone()
        .unwrap_or_else(|| format!("{}@localhost", username));
    let hashed_password = hash_password(password)?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (username, email, password, is_staff, date_joined, created_at, updated_at)
        VALUES (?, ?, ?, 1, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::info!("Admin user created successfully.");
    Ok(true)
}
