use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::{AppError, FieldErrors},
    handlers::auth::{current_user, map_user_write_error, uniqueness_errors},
    models::user::{ChangePasswordRequest, UpdateProfileRequest, UserProfile},
    utils::{
        hash::{hash_password, verify_password},
        json::AppJson,
        jwt::Claims,
        password::password_policy_errors,
        validate::normalize_email,
    },
};

/// Get current user's profile.
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// Update the current user's profile (PUT and PATCH).
///
/// Only the fields present in the payload change. Passwords are never touched
/// here, see `change_password`.
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    if payload.is_empty() {
        return Ok(Json(UserProfile::from(&user)));
    }

    let mut errors = match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(validation_errors) => FieldErrors::from(validation_errors),
    };

    let email = payload.email.as_deref().map(normalize_email);
    errors.merge(
        uniqueness_errors(
            &pool,
            payload.username.as_deref(),
            email.as_deref(),
            Some(user.id),
        )
        .await?,
    );
    errors.into_result()?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    separated.push("updated_at = ");
    separated.push_bind_unseparated(Utc::now());

    if let Some(username) = payload.username {
        separated.push("username = ");
        separated.push_bind_unseparated(username);
    }

    if let Some(email) = email {
        separated.push("email = ");
        separated.push_bind_unseparated(email);
    }

    if let Some(first_name) = payload.first_name {
        separated.push("first_name = ");
        separated.push_bind_unseparated(first_name);
    }

    if let Some(last_name) = payload.last_name {
        separated.push("last_name = ");
        separated.push_bind_unseparated(last_name);
    }

    if let Some(phone_number) = payload.phone_number {
        separated.push("phone_number = ");
        separated.push_bind_unseparated(phone_number);
    }

    if let Some(gender) = payload.gender {
        separated.push("gender = ");
        separated.push_bind_unseparated(gender);
    }

    if let Some(date_of_birth) = payload.date_of_birth {
        separated.push("date_of_birth = ");
        separated.push_bind_unseparated(date_of_birth);
    }

    if let Some(bio) = payload.bio {
        separated.push("bio = ");
        separated.push_bind_unseparated(bio);
    }

    if let Some(address) = payload.address {
        separated.push("address = ");
        separated.push_bind_unseparated(address);
    }

    if let Some(profile_picture) = payload.profile_picture {
        separated.push("profile_picture = ");
        separated.push_bind_unseparated(profile_picture);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(user.id);

    builder
        .build()
        .execute(&pool)
        .await
        .map_err(map_user_write_error)?;

    let updated = current_user(&pool, &claims).await?;
    tracing::info!("Updated profile of user id {}", updated.id);

    Ok(Json(UserProfile::from(&updated)))
}

/// Change the current user's password.
///
/// The old password must match the stored hash; otherwise nothing is written.
/// Tokens issued before the change remain valid until they expire.
pub async fn change_password(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let mut errors = match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(validation_errors) => FieldErrors::from(validation_errors),
    };

    if !payload.old_password.is_empty() && !verify_password(&payload.old_password, &user.password)?
    {
        errors.add("old_password", "Incorrect old password.");
    }

    let local_part = user.email.split('@').next().unwrap_or_default();
    for message in password_policy_errors(
        &payload.new_password,
        &[
            ("username", user.username.as_str()),
            ("email address", local_part),
        ],
    ) {
        errors.add("new_password", message);
    }

    errors.into_result()?;

    let hashed_password = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE users SET password = ?, updated_at = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update password: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    tracing::info!("Password changed for user id {}", user.id);

    Ok(Json(serde_json::json!({
        "message": "Password updated successfully"
    })))
}
