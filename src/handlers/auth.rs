// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, FieldErrors},
    models::user::{
        LoginRequest, RefreshRequest, RegisterRequest, USER_COLUMNS, User, UserProfile,
        UserSummary,
    },
    utils::{
        hash::{hash_password, verify_password},
        json::AppJson,
        jwt::{Claims, TokenPair, TokenType, issue_token_pair, sign_jwt, verify_jwt},
        password::password_policy_errors,
        validate::normalize_email,
    },
};

pub(crate) const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
pub(crate) const DUPLICATE_EMAIL: &str = "user with this email already exists.";

#[derive(Debug, Serialize)]
struct RegisterResponse {
    status: &'static str,
    user: UserSummary,
    tokens: TokenPair,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: UserProfile,
}

pub(crate) async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Loads the user behind an access token.
/// A token whose user has vanished or been deactivated is treated as invalid.
pub(crate) async fn current_user(pool: &SqlitePool, claims: &Claims) -> Result<User, AppError> {
    match find_user_by_id(pool, claims.user_id()?).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AppError::AuthError("User not found".to_string())),
    }
}

/// Field errors for a username/email already owned by another account.
pub(crate) async fn uniqueness_errors(
    pool: &SqlitePool,
    username: Option<&str>,
    email: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<FieldErrors, AppError> {
    let mut errors = FieldErrors::new();
    if username.is_none() && email.is_none() {
        return Ok(errors);
    }

    let taken: Vec<(String, String)> = sqlx::query_as(
        "SELECT username, email FROM users WHERE (username = ? OR email = ?) AND id != ?",
    )
    .bind(username)
    .bind(email)
    .bind(exclude_id.unwrap_or(-1))
    .fetch_all(pool)
    .await?;

    if let Some(username) = username {
        if taken.iter().any(|(u, _)| u == username) {
            errors.add("username", DUPLICATE_USERNAME);
        }
    }
    if let Some(email) = email {
        if taken.iter().any(|(_, e)| e == email) {
            errors.add("email", DUPLICATE_EMAIL);
        }
    }
    Ok(errors)
}

/// Maps constraint violations raised by a user write to client errors:
/// unique violations become the matching field error, CHECK violations a 400.
/// Anything else stays a database error.
pub(crate) fn map_user_write_error(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let field = if db_err.message().contains("users.email") {
                ("email", DUPLICATE_EMAIL)
            } else {
                ("username", DUPLICATE_USERNAME)
            };
            return AppError::Validation(FieldErrors::single(field.0, field.1));
        }
        if db_err.is_check_violation() {
            tracing::debug!("User write rejected by CHECK constraint: {}", db_err.message());
            return AppError::BadRequest("Invalid field value".to_string());
        }
    }
    tracing::error!("Failed to write user: {:?}", err);
    AppError::from(err)
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default()
}

/// Registers a new user.
///
/// Collects every field problem (format, password confirmation, strength
/// policy, duplicates) into one 400 response. On success the password is
/// hashed with Argon2 and a token pair is issued alongside the user summary.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(validation_errors) => FieldErrors::from(validation_errors),
    };

    if payload.password != payload.password2 {
        errors.add("password", "Password fields didn't match.");
    }

    let email = normalize_email(&payload.email);

    for message in password_policy_errors(
        &payload.password,
        &[
            ("username", payload.username.as_str()),
            ("email address", email_local_part(&email)),
        ],
    ) {
        errors.add("password", message);
    }

    errors.merge(uniqueness_errors(&pool, Some(&payload.username), Some(&email), None).await?);
    errors.into_result()?;

    let hashed_password = hash_password(&payload.password)?;
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (
            username, email, password, first_name, last_name, phone_number,
            gender, date_of_birth, bio, address, profile_picture,
            date_joined, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(&payload.username)
    .bind(&email)
    .bind(&hashed_password)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.phone_number)
    .bind(payload.gender)
    .bind(payload.date_of_birth)
    .bind(&payload.bio)
    .bind(&payload.address)
    .bind(&payload.profile_picture)
    .bind(now)
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(map_user_write_error)?;

    tracing::info!("Registered user {} (id {})", user.username, user.id);

    let tokens = issue_token_pair(&user, &config)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            status: "success",
            user: UserSummary::from(&user),
            tokens,
        }),
    ))
}

/// Authenticates a user and returns an access/refresh token pair.
///
/// Unknown usernames, wrong passwords and inactive accounts all produce the
/// same 401 so callers cannot tell which part was wrong.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let invalid = || AppError::AuthError("Invalid credentials".to_string());

    let Some(user) = user else {
        tracing::debug!("Login failed: unknown username");
        return Err(invalid());
    };

    if !verify_password(&payload.password, &user.password)? || !user.is_active {
        tracing::debug!("Login failed for user id {}", user.id);
        return Err(invalid());
    }

    let tokens = issue_token_pair(&user, &config)?;

    Ok(Json(LoginResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user: UserProfile::from(&user),
    }))
}

/// Exchanges a refresh token for a new access token.
/// Stateless: the refresh token itself is neither stored nor rotated.
pub async fn refresh_token(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let claims = verify_jwt(&payload.refresh, &config.jwt_secret, TokenType::Refresh)?;
    let user = current_user(&pool, &claims).await?;

    let access = sign_jwt(
        &user,
        TokenType::Access,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;

    Ok(Json(serde_json::json!({ "access": access })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_part_of_email() {
        assert_eq!(email_local_part("jane@example.com"), "jane");
        assert_eq!(email_local_part("plain"), "plain");
    }
}
