//! High-level client composing executor, timeout and retry.
//!
//! [`ApiClient`] offers the three call styles applications use:
//!
//! | method                  | stack                                  |
//! |-------------------------|----------------------------------------|
//! | `request`               | executor                               |
//! | `request_with_timeout`  | timeout → executor                     |
//! | `request_with_retry`    | retry → timeout → executor             |
//! | `upload`                | timeout → executor (multipart body)    |
//!
//! The verb helpers (`get`, `post`, ...) go through `request_with_retry`.
//!
//! ```rust
//! use apiguard::transport::ScriptedTransport;
//! use apiguard::{ApiClient, RequestDescriptor};
//! use serde_json::{json, Value};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let transport = ScriptedTransport::new();
//! transport.push_json(404, json!({ "error": "not found" }));
//!
//! let client = ApiClient::new(transport);
//! let err = client.request::<Value>(&RequestDescriptor::get("/projects")).await.unwrap_err();
//! assert_eq!(err.message(), "not found");
//! assert_eq!(err.status_code(), Some(404));
//! # });
//! ```

use crate::config::{ClientConfig, ConfigError};
use crate::descriptor::{FormPayload, RequestDescriptor};
use crate::executor::RequestExecutor;
use crate::transport::Transport;
use crate::{Outcome, RetryPolicy, TimeoutPolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiClient<T> {
    executor: RequestExecutor<T>,
    timeout: TimeoutPolicy,
    retry: RetryPolicy,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self { executor: self.executor.clone(), timeout: self.timeout, retry: self.retry.clone() }
    }
}

impl<T: Transport> ApiClient<T> {
    /// Client with the default 10s deadline and 3 attempts with 1s linear backoff.
    pub fn new(transport: T) -> Self {
        Self::with_executor(RequestExecutor::new(transport))
    }

    pub fn with_executor(executor: RequestExecutor<T>) -> Self {
        Self { executor, timeout: TimeoutPolicy::default(), retry: RetryPolicy::default() }
    }

    pub fn from_config(transport: T, config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut executor = RequestExecutor::new(transport);
        if let Some(base_url) = &config.base_url {
            executor = executor.with_base_url(base_url.clone());
        }
        for (name, value) in &config.default_headers {
            executor = executor.with_default_header(name, value).map_err(|e| {
                ConfigError::InvalidHeader { name: name.clone(), reason: e.message().to_string() }
            })?;
        }
        Ok(Self { executor, timeout: config.timeout_policy()?, retry: config.retry_policy() })
    }

    pub fn with_timeout(mut self, timeout: TimeoutPolicy) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// One attempt, no deadline.
    pub async fn request<R>(&self, descriptor: &RequestDescriptor) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        self.executor.execute(descriptor).await
    }

    /// One attempt bounded by `timeout`, or the client's deadline when `None`.
    pub async fn request_with_timeout<R>(
        &self,
        descriptor: &RequestDescriptor,
        timeout: Option<TimeoutPolicy>,
    ) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        let timeout = timeout.unwrap_or(self.timeout);
        timeout.execute(|| self.executor.execute(descriptor)).await
    }

    /// Retried attempts, each bounded by the client's deadline.
    pub async fn request_with_retry<R>(&self, descriptor: &RequestDescriptor) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        self.retry
            .execute(|| self.timeout.execute(|| self.executor.execute(descriptor)))
            .await
    }

    /// Multipart upload: one attempt bounded by the client's deadline.
    pub async fn upload<R>(&self, descriptor: &RequestDescriptor, form: FormPayload) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        self.timeout.execute(|| self.executor.execute_form(descriptor, form)).await
    }

    pub async fn get<R>(&self, url: &str) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        self.request_with_retry(&RequestDescriptor::get(url)).await
    }

    pub async fn delete<R>(&self, url: &str) -> Outcome<R>
    where
        R: DeserializeOwned,
    {
        self.request_with_retry(&RequestDescriptor::delete(url)).await
    }

    pub async fn post<B, R>(&self, url: &str, body: &B) -> Outcome<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request_with_retry(&RequestDescriptor::post(url).json(body)?).await
    }

    pub async fn put<B, R>(&self, url: &str, body: &B) -> Outcome<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request_with_retry(&RequestDescriptor::put(url).json(body)?).await
    }

    pub async fn patch<B, R>(&self, url: &str, body: &B) -> Outcome<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request_with_retry(&RequestDescriptor::patch(url).json(body)?).await
    }
}
