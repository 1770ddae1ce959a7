// src/models/user.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::validate::{
    validate_not_blank, validate_phone_number, validate_picture_url, validate_username,
};

/// Single-character gender code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Gender {
    #[serde(rename = "M")]
    #[sqlx(rename = "M")]
    Male,
    #[serde(rename = "F")]
    #[sqlx(rename = "F")]
    Female,
    #[serde(rename = "O")]
    #[sqlx(rename = "O")]
    Other,
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Unique email, domain part stored lower-cased.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
    pub address: Option<String>,

    /// URL reference; upload storage lives elsewhere.
    pub profile_picture: Option<String>,

    pub is_active: bool,
    pub is_staff: bool,

    pub date_joined: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list shared by every `SELECT ... FROM users` that loads a `User`.
pub const USER_COLUMNS: &str = "id, username, email, password, first_name, last_name, \
     phone_number, gender, date_of_birth, bio, address, profile_picture, \
     is_active, is_staff, date_joined, created_at, updated_at";

#[cfg(test)]
impl User {
    pub fn fixture(id: i64, username: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password: "$argon2id$fixture".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
            gender: None,
            date_of_birth: None,
            bio: None,
            address: None,
            profile_picture: None,
            is_active: true,
            is_staff: false,
            date_joined: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public fields returned right after registration.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// The caller's own profile (profile endpoint and login payload).
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            gender: user.gender,
            date_of_birth: user.date_of_birth,
            bio: user.bio.clone(),
            address: user.address.clone(),
            profile_picture: user.profile_picture.clone(),
            created_at: user.created_at,
        }
    }
}

/// Row shape of the admin user listing.
#[derive(Debug, Serialize, FromRow)]
pub struct AdminUserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."),
        custom(function = validate_username)
    )]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "This field may not be blank."))]
    pub password: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "This field may not be blank."))]
    pub password2: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: String,

    #[validate(
        length(max = 15, message = "Ensure this field has no more than 15 characters."),
        custom(function = validate_phone_number)
    )]
    pub phone_number: Option<String>,

    pub gender: Option<Gender>,

    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 500, message = "Ensure this field has no more than 500 characters."))]
    pub bio: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub address: Option<String>,

    #[validate(
        length(max = 500, message = "Ensure this field has no more than 500 characters."),
        custom(function = validate_picture_url)
    )]
    pub profile_picture: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(custom(function = validate_not_blank))]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = validate_not_blank))]
    pub password: String,
}

/// DTO for exchanging a refresh token for a new access token.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[serde(default)]
    #[validate(custom(function = validate_not_blank))]
    pub refresh: String,
}

/// Partial profile update; absent or null fields are left as they are.
/// Unknown keys (including `password`) are ignored.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."),
        custom(function = validate_username)
    )]
    pub username: Option<String>,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,

    #[validate(
        length(max = 15, message = "Ensure this field has no more than 15 characters."),
        custom(function = validate_phone_number)
    )]
    pub phone_number: Option<String>,

    pub gender: Option<Gender>,

    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 500, message = "Ensure this field has no more than 500 characters."))]
    pub bio: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub address: Option<String>,

    #[validate(
        length(max = 500, message = "Ensure this field has no more than 500 characters."),
        custom(function = validate_picture_url)
    )]
    pub profile_picture: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.gender.is_none()
            && self.date_of_birth.is_none()
            && self.bio.is_none()
            && self.address.is_none()
            && self.profile_picture.is_none()
    }
}

/// DTO for changing the caller's password.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(custom(function = validate_not_blank))]
    pub old_password: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "This field may not be blank."))]
    pub new_password: String,
}
