//! Request descriptors.
//!
//! A [`RequestDescriptor`] captures everything needed for one logical request: target,
//! method, headers, and body. It is built once and reused unchanged across retry attempts.
//!
//! ```rust
//! use apiguard::RequestDescriptor;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), apiguard::RequestError> {
//! let descriptor = RequestDescriptor::post("/projects")
//!     .header("x-request-source", "dashboard")?
//!     .json(&json!({ "name": "apollo" }))?;
//! assert_eq!(descriptor.url(), "/projects");
//! # Ok(())
//! # }
//! ```

use crate::RequestError;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::fmt;

/// HTTP methods accepted by the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multipart form upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file_name: String, content_type: Option<String>, bytes: Vec<u8> },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Pre-built multipart form payload. Sent as-is; never JSON-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    parts: Vec<FormPart>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text { name: name.into(), value: value.into() });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        });
        self
    }

    /// Add a file part with an explicit MIME type.
    pub fn file_with_type(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: Some(content_type.into()),
            bytes: bytes.into(),
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Body attached to a descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(FormPayload),
}

/// Immutable description of a single logical request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    url: String,
    method: Method,
    headers: HeaderMap,
    body: RequestBody,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { url: url.into(), method, headers: HeaderMap::new(), body: RequestBody::Empty }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Set a header. Names are case-insensitive and a later write replaces an earlier one.
    /// Values are taken as raw bytes, so UTF-8 text is accepted; control characters other
    /// than tab are rejected.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, RequestError> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set several headers in iteration order.
    pub fn headers<I, K, V>(self, headers: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers.into_iter().try_fold(self, |acc, (k, v)| acc.header(k.as_ref(), v.as_ref()))
    }

    /// Attach a JSON body serialized from `body`.
    pub fn json<B>(mut self, body: &B) -> Result<Self, RequestError>
    where
        B: Serialize + ?Sized,
    {
        let value = serde_json::to_value(body)
            .map_err(|e| RequestError::encode(format!("failed to serialize request body: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Attach an already-built JSON value.
    pub fn json_value(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    /// Attach a multipart form payload in place of a JSON body.
    pub fn form(mut self, payload: FormPayload) -> Self {
        self.body = RequestBody::Form(payload);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}

pub(crate) fn parse_header(
    name: &str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), RequestError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RequestError::encode(format!("invalid header name: {name:?}")))?;
    let header_value = HeaderValue::from_bytes(value.as_bytes())
        .map_err(|_| RequestError::encode(format!("invalid value for header {name}")))?;
    Ok((header_name, header_value))
}
