//! Transport boundary.
//!
//! The request layer never talks to the network directly. It hands a fully prepared
//! [`TransportRequest`] to a [`Transport`] and gets back either a [`TransportResponse`]
//! (any status code) or a [`TransportError`] when the round trip could not complete.
//!
//! Implementations:
//! - [`ScriptedTransport`]: canned outcomes for tests and demos.
//! - `ReqwestTransport` (feature `reqwest`): production adapter over `reqwest::Client`.

use crate::descriptor::FormPayload;
use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

#[cfg(feature = "reqwest")]
mod reqwest_transport;
mod scripted;

#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;
pub use scripted::ScriptedTransport;

/// Body as handed to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransportBody {
    #[default]
    Empty,
    /// Already-encoded bytes (JSON text for the executor's JSON path).
    Bytes(Vec<u8>),
    /// Multipart payload; the transport writes the boundary and content type.
    Form(FormPayload),
}

/// One fully prepared round trip.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: http::Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: TransportBody,
}

/// Raw response from one completed round trip.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self { status, headers, body }
    }

    /// Response with a JSON body and matching content type.
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        Self { status, headers, body: value.to_string().into_bytes() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// The round trip did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Capability to perform exactly one HTTP round trip.
///
/// Dropping the returned future must abandon the request; the timeout guard relies on
/// this to cancel slow attempts.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug + 'static {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_response_sets_content_type() {
        let response = TransportResponse::json(StatusCode::OK, &json!({ "id": 1 }));
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "application/json");
        let value: serde_json::Value = response.parse_json().unwrap();
        assert_eq!(value, json!({ "id": 1 }));
    }

    #[test]
    fn transport_error_displays_message() {
        let err = TransportError::new("connection refused");
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.message(), "connection refused");
    }
}
