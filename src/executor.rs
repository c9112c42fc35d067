//! Single-attempt request execution.
//!
//! [`RequestExecutor`] performs exactly one round trip per call:
//!
//! 1. merge headers (defaults first, caller headers over them),
//! 2. encode the body (JSON text, or a multipart payload passed through untouched),
//! 3. send through the [`Transport`],
//! 4. map the result: transport failure, normalized status error, or decoded JSON.
//!
//! A successful status with a body that is not valid JSON for the expected type is a
//! [`ErrorKind::Decode`](crate::ErrorKind::Decode) failure, never a default value.

use crate::descriptor::{parse_header, FormPayload, RequestBody, RequestDescriptor};
use crate::normalize::{is_success, normalize_response};
use crate::transport::{Transport, TransportBody, TransportRequest};
use crate::{Outcome, RequestError};
use futures::future::BoxFuture;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;
use tracing::debug;

/// Content type set on every JSON request unless the caller supplies one.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Issues one request per call against a shared transport.
#[derive(Debug)]
pub struct RequestExecutor<T> {
    transport: Arc<T>,
    base_url: Option<String>,
    default_headers: HeaderMap,
}

impl<T> Clone for RequestExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
            default_headers: self.default_headers.clone(),
        }
    }
}

impl<T: Transport> RequestExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    pub fn from_shared(transport: Arc<T>) -> Self {
        Self { transport, base_url: None, default_headers: HeaderMap::new() }
    }

    /// Prefix relative descriptor URLs with `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Header sent with every request unless the descriptor overrides it.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Result<Self, RequestError> {
        let (name, value) = parse_header(name, value)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Absolute URLs pass through; anything else is appended to the base URL verbatim.
    pub fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !is_absolute(url) => format!("{base}{url}"),
            _ => url.to_string(),
        }
    }

    /// Send `descriptor` once and decode a successful JSON response as `R`.
    pub async fn execute<R>(&self, descriptor: &RequestDescriptor) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        let request = self.prepare(descriptor, descriptor.body())?;
        self.dispatch(request).await
    }

    /// Send `descriptor` once with `form` as a multipart body in place of any JSON body.
    pub async fn execute_form<R>(
        &self,
        descriptor: &RequestDescriptor,
        form: FormPayload,
    ) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        let request = self.prepare(descriptor, &RequestBody::Form(form))?;
        self.dispatch(request).await
    }

    fn prepare(
        &self,
        descriptor: &RequestDescriptor,
        body: &RequestBody,
    ) -> Outcome<TransportRequest> {
        let is_form = matches!(body, RequestBody::Form(_));
        let mut headers = HeaderMap::new();
        if !is_form {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        for (name, value) in self.default_headers.iter().chain(descriptor.header_map()) {
            // Multipart bodies carry their own boundary in the content type.
            if is_form && *name == CONTENT_TYPE {
                continue;
            }
            headers.insert(name.clone(), value.clone());
        }

        let body = match body {
            RequestBody::Empty => TransportBody::Empty,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value).map_err(|e| {
                    RequestError::encode(format!("failed to serialize request body: {e}"))
                })?;
                TransportBody::Bytes(bytes)
            }
            RequestBody::Form(form) => TransportBody::Form(form.clone()),
        };

        Ok(TransportRequest {
            method: descriptor.method().into(),
            url: self.resolve_url(descriptor.url()),
            headers,
            body,
        })
    }

    async fn dispatch<R>(&self, request: TransportRequest) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "transport failure");
                return Err(RequestError::transport(err.to_string()));
            }
        };

        let status = response.status();
        debug!(status = status.as_u16(), "response received");
        if !is_success(status) {
            return Err(normalize_response(&response));
        }

        response.parse_json().map_err(|e| {
            RequestError::decode(format!(
                "failed to parse response body from {} as JSON: {e}",
                status.as_u16()
            ))
        })
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Tower entry point: yields the decoded body as an untyped JSON value.
impl<T: Transport> Service<RequestDescriptor> for RequestExecutor<T> {
    type Response = serde_json::Value;
    type Error = RequestError;
    type Future = BoxFuture<'static, Outcome<serde_json::Value>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, descriptor: RequestDescriptor) -> Self::Future {
        let executor = self.clone();
        Box::pin(async move { executor.execute(&descriptor).await })
    }
}
