//! Username validation helpers.

use crate::error::ProbeError;

/// Characters that would change the meaning of a profile URL if spliced in.
///
/// `\` is read as `/` in http(s) URLs; `@` and `:` would turn a subdomain
/// template's host into userinfo or a port.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '?', '#', '@', ':'];

/// Validate a username before it is substituted into probe URLs.
///
/// Returns the trimmed username on success.
pub fn validate_username(username: &str) -> Result<&str, ProbeError> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ProbeError::invalid_username(
            username,
            "Username cannot be empty",
        ));
    }

    if username.chars().any(char::is_whitespace) {
        return Err(ProbeError::invalid_username(
            username,
            "Username cannot contain whitespace",
        ));
    }

    if let Some(c) = username.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(ProbeError::invalid_username(
            username,
            format!("Username cannot contain '{}'", c),
        ));
    }

    Ok(username)
}
