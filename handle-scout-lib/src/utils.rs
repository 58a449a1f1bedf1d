//! Utility functions for username validation and template formatting.

use crate::error::HandleCheckError;
use crate::types::USERNAME_PLACEHOLDER;

/// Minimum username length, in characters.
pub const MIN_USERNAME_LEN: usize = 2;

/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 30;

/// Validate a username.
///
/// A username is 2-30 characters long and made of letters, digits,
/// underscores and dots. The same rule filters generated suggestions.
///
/// # Returns
///
/// `Ok(())` if valid, `Err(HandleCheckError::InvalidUsername)` otherwise.
pub fn validate_username(username: &str) -> Result<(), HandleCheckError> {
    if username.is_empty() {
        return Err(HandleCheckError::invalid_username(
            username,
            "Username is required",
        ));
    }

    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(HandleCheckError::invalid_username(
            username,
            "Username must be 2-30 characters",
        ));
    }

    if !username.chars().all(is_username_char) {
        return Err(HandleCheckError::invalid_username(
            username,
            "Only letters, numbers, underscore, dot allowed",
        ));
    }

    Ok(())
}

/// Boolean form of [`validate_username`].
pub fn is_valid_username(username: &str) -> bool {
    validate_username(username).is_ok()
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Substitute every `{username}` placeholder in `template`.
pub fn fill_template(template: &str, username: &str) -> String {
    template.replace(USERNAME_PLACEHOLDER, username)
}
