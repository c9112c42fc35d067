//! Convenient re-exports for common apiguard types.
pub use crate::{
    backoff::{Backoff, MAX_BACKOFF},
    client::ApiClient,
    compose::{CombinedLayer, Policy},
    descriptor::{FormPayload, Method, RequestDescriptor},
    error::{ErrorKind, Outcome, RequestError},
    executor::RequestExecutor,
    retry::{RetryLayer, RetryPolicy},
    timeout::{TimeoutLayer, TimeoutPolicy},
    transport::Transport,
};
