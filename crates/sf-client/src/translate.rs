//! Translation of non-2xx platform responses into typed errors.
//!
//! The base kind comes from the status code alone. The body is then decoded,
//! from the already-buffered bytes, as the platform's error array; when that
//! works the first entry's message and fields are attached. Any failure to
//! decode the body leaves the base error untouched.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{ApiError, Error};

/// Maximum length of a platform message carried in an error.
const MAX_MESSAGE_LENGTH: usize = 500;

/// Translate a status code and buffered response body into an [`Error`].
pub fn translate(status: u16, body: &[u8]) -> Error {
    let mut err = ApiError::from_status(status);

    if let Some(detail) = first_platform_error(body) {
        err.message = Some(sanitize_error_message(&detail.message));
        err.fields = detail.fields.unwrap_or_default();
        err.error_code = detail.error_code;
    }

    err.into()
}

/// Error entry as reported by the REST and Bulk APIs.
#[derive(Debug, Deserialize)]
struct PlatformError {
    message: String,
    #[serde(rename = "errorCode", alias = "error_code", default)]
    error_code: Option<String>,
    #[serde(default)]
    fields: Option<Vec<String>>,
}

/// Decode the first platform error from the body, if there is one.
fn first_platform_error(body: &[u8]) -> Option<PlatformError> {
    if body.is_empty() {
        return None;
    }

    if let Ok(errors) = serde_json::from_slice::<Vec<PlatformError>>(body) {
        return errors.into_iter().next();
    }

    // A few endpoints answer with a bare object instead of an array.
    serde_json::from_slice::<PlatformError>(body).ok()
}

fn token_pattern() -> Option<&'static regex_lite::Regex> {
    static PATTERN: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+").ok())
        .as_ref()
}

fn session_pattern() -> Option<&'static regex_lite::Regex> {
    static PATTERN: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}").ok())
        .as_ref()
}

/// Redact access tokens and session ids and cap the length of a platform
/// message before it is stored in an error.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = message.to_string();

    if let Some(pattern) = token_pattern() {
        sanitized = pattern
            .replace_all(&sanitized, "[REDACTED_TOKEN]")
            .into_owned();
    }
    if let Some(pattern) = session_pattern() {
        sanitized = pattern.replace_all(&sanitized, "sid=[REDACTED]").into_owned();
    }

    if sanitized.len() > MAX_MESSAGE_LENGTH {
        let mut cut = MAX_MESSAGE_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
