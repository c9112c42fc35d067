//! Normalization of non-success responses into [`RequestError`].
//!
//! The message is taken from the body's `message` field, else its `error` field, when the
//! body is a JSON object carrying a non-empty string there. Anything else falls back to
//! `"{code}: {reason}"`, e.g. `"500: Internal Server Error"`.

use crate::transport::TransportResponse;
use crate::RequestError;
use http::StatusCode;
use serde_json::Value;

const MESSAGE_FIELDS: [&str; 2] = ["message", "error"];

/// Whether `status` is in the inclusive success range 200–299.
pub fn is_success(status: StatusCode) -> bool {
    (200..=299).contains(&status.as_u16())
}

/// Fallback message built from the status code and its standard reason phrase.
pub fn status_message(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    format!("{}: {}", status.as_u16(), reason)
}

/// Convert a non-success response into a normalized error. Always carries the status.
pub fn normalize_response(response: &TransportResponse) -> RequestError {
    let status = response.status();
    let message = message_from_body(response.body()).unwrap_or_else(|| status_message(status));
    RequestError::status(status.as_u16(), message)
}

fn message_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;
    MESSAGE_FIELDS.iter().find_map(|field| {
        object
            .get(*field)
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_owned)
    })
}
