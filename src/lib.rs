#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # apiguard
//!
//! A resilient request layer for JSON APIs: every call goes through a transport,
//! non-2xx responses become typed errors with readable messages, each attempt can be
//! bounded by a deadline, and failures can be retried with linear backoff.
//!
//! ## Features
//!
//! - **Error normalization**: one [`RequestError`] shape for transport faults, HTTP
//!   statuses, undecodable bodies and timeouts
//! - **Request execution** over a pluggable [`Transport`] (reqwest by default)
//! - **Timeouts** that cancel the abandoned attempt
//! - **Retry policies** with linear backoff and an optional retry predicate
//! - **Tower layers** for both, composable in either order via [`compose::Policy`]
//!
//! ## Quick Start
//!
//! ```rust
//! use apiguard::transport::ScriptedTransport;
//! use apiguard::{ApiClient, RetryPolicy, TimeoutPolicy};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = ScriptedTransport::new();
//!     transport
//!         .push_failure("connection reset")
//!         .push_json(200, json!({ "projects": [] }));
//!
//!     let client = ApiClient::new(transport)
//!         .with_timeout(TimeoutPolicy::from_millis(2_000).unwrap())
//!         .with_retry(RetryPolicy::builder().max_attempts(3).without_waiting().build());
//!
//!     let body: Value = client.get("/projects").await.unwrap();
//!     assert_eq!(body["projects"], json!([]));
//! }
//! ```

pub mod backoff;
pub mod client;
pub mod compose;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod prelude;
pub mod retry;
pub mod sleeper;
pub mod timeout;
pub mod transport;

// Re-exports
pub use backoff::{Backoff, BackoffError};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use descriptor::{FormPart, FormPayload, Method, RequestBody, RequestDescriptor};
pub use error::{ErrorKind, Outcome, RequestError};
pub use executor::RequestExecutor;
pub use retry::{RetryLayer, RetryPolicy, RetryPolicyBuilder, RetryService};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use timeout::{RaceState, Timeout, TimeoutError, TimeoutLayer, TimeoutPolicy, TimeoutService};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{
    ScriptedTransport, Transport, TransportBody, TransportError, TransportRequest,
    TransportResponse,
};
