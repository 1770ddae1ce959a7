// src/utils/validate.rs

//! Custom field validators plugged into `#[validate(custom(...))]`.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;
use url::Url;
use validator::ValidationError;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username regex is valid"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()\-]*$").expect("phone regex is valid"));

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Letters, digits and `@ . + - _` only.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(error(
            "invalid_username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

/// Digits with optional leading `+` and common separators.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if !PHONE_RE.is_match(phone) {
        return Err(error("invalid_phone", "Enter a valid phone number."));
    }
    Ok(())
}

/// Profile pictures are stored as absolute http(s) URL references.
pub fn validate_picture_url(url: &str) -> Result<(), ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(error("invalid_url", "Enter a valid URL.")),
    }
}

/// Rejects strings that are empty once whitespace is trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "This field may not be blank."));
    }
    Ok(())
}

/// Lower-cases the domain part of an email address, keeping the local part.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username("alice.b+quiz@home-1_x").is_ok());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
    }

    #[test]
    fn phone_numbers() {
        assert!(validate_phone_number("+1 (555) 010-99").is_ok());
        assert!(validate_phone_number("call me").is_err());
    }

    #[test]
    fn picture_urls() {
        assert!(validate_picture_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_picture_url("ftp://example.com/a.png").is_err());
        assert!(validate_picture_url("not a url").is_err());
    }

    #[test]
    fn blank_strings() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank(" x ").is_ok());
    }

    #[test]
    fn email_domain_is_lowercased() {
        assert_eq!(normalize_email(" John.Doe@EXAMPLE.Com "), "John.Doe@example.com");
        assert_eq!(normalize_email("nodomain"), "nodomain");
    }
}
