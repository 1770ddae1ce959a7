// src/utils/password.rs

//! Password strength policy applied on registration and password change.

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lower-cased, frequently leaked passwords that are refused outright.
const COMMON_PASSWORDS: &[&str] = &[
    "123456", "123456789", "12345678", "1234567890", "password", "password1",
    "password123", "qwerty", "qwerty123", "qwertyuiop", "abc123", "111111",
    "123123", "iloveyou", "admin", "admin123", "welcome", "welcome1",
    "letmein", "monkey", "dragon", "football", "baseball", "sunshine",
    "princess", "master", "shadow", "superman", "trustno1", "passw0rd",
    "1q2w3e4r", "1qaz2wsx", "zaq12wsx", "starwars", "whatever", "freedom",
    "michael", "jennifer", "hello123", "changeme",
];

/// Returns every policy message the password violates; empty means accepted.
///
/// `attributes` pairs a human-readable attribute name with the user's value,
/// e.g. `("username", "alice")`.
pub fn password_policy_errors(password: &str, attributes: &[(&str, &str)]) -> Vec<String> {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }

    let lowered = password.to_lowercase();

    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        errors.push("This password is too common.".to_string());
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.push("This password is entirely numeric.".to_string());
    }

    for (name, value) in attributes {
        if is_too_similar(&lowered, &value.to_lowercase()) {
            errors.push(format!("The password is too similar to the {}.", name));
            break;
        }
    }

    errors
}

fn is_too_similar(password: &str, attribute: &str) -> bool {
    // Short attributes match too much by accident.
    if attribute.chars().count() < 3 {
        return false;
    }
    password == attribute || password.contains(attribute) || attribute.contains(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes() {
        assert!(password_policy_errors("Tr1cky-Zebra!", &[("username", "alice")]).is_empty());
    }

    #[test]
    fn short_password_is_rejected() {
        let errors = password_policy_errors("aB3$", &[]);
        assert!(errors.iter().any(|e| e.contains("too short")));
    }

    #[test]
    fn common_password_is_rejected_case_insensitively() {
        let errors = password_policy_errors("PassWord123", &[]);
        assert_eq!(errors, vec!["This password is too common.".to_string()]);
    }

    #[test]
    fn numeric_password_is_rejected() {
        let errors = password_policy_errors("40982716355", &[]);
        assert_eq!(errors, vec!["This password is entirely numeric.".to_string()]);
    }

    #[test]
    fn password_containing_username_is_rejected() {
        let errors = password_policy_errors("bobbington-99", &[("username", "Bobbington")]);
        assert_eq!(
            errors,
            vec!["The password is too similar to the username.".to_string()]
        );
    }

    #[test]
    fn tiny_attributes_are_ignored() {
        assert!(password_policy_errors("ab-longer-phrase", &[("username", "ab")]).is_empty());
    }
}
