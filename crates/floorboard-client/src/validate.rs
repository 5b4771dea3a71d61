//! Local input validation
//!
//! These checks run before any backend call. A failure here never reaches
//! the network.

use floorboard_core::ValidationError;

use crate::config::ClientConfig;

/// Trim `text` and reject it if nothing is left.
///
/// Returns the trimmed text, which is what gets stored.
pub fn validate_message_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    Ok(trimmed.to_string())
}

/// Reject an empty (or whitespace-only) password.
pub fn validate_password_present(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(())
}

/// Shape check for an email address: one `@`, a non-empty local part, and a
/// domain containing a dot with text on both sides of it.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValidationError::MalformedEmail);
    };
    if local.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::MalformedEmail);
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(email.to_string()),
        _ => Err(ValidationError::MalformedEmail),
    }
}

/// Username format: bounded length, ASCII letters, digits, `_` and `.` only.
///
/// Availability is checked separately against the profile store.
pub fn validate_username(username: &str, config: &ClientConfig) -> Result<String, ValidationError> {
    let username = username.trim();
    let len = username.chars().count();
    if len < config.username_min_len || len > config.username_max_len {
        return Err(ValidationError::UsernameLength {
            min: config.username_min_len,
            max: config.username_max_len,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(ValidationError::UsernameCharacters);
    }
    Ok(username.to_string())
}
