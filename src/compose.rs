//! Explicit decorator ordering for tower layers.
//!
//! `Policy(A) + Policy(B)` builds a layer where `A` wraps `B`, which wraps the service:
//! `A(B(service))`. Neither order is built in; choose per call site.
//!
//! ```
//! use apiguard::compose::Policy;
//! use apiguard::{RetryLayer, RetryPolicy, TimeoutLayer};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let retry = Policy(RetryLayer::new(RetryPolicy::default()));
//! let timeout = Policy(TimeoutLayer::new(Duration::from_secs(2))?);
//!
//! // Each attempt gets its own two second window.
//! let _per_attempt = retry.clone() + timeout;
//! // One two second window for all attempts together.
//! let _overall = Policy(TimeoutLayer::new(Duration::from_secs(2))?) + retry;
//! # Ok(())
//! # }
//! ```

use std::ops::Add;
use tower_layer::Layer;

/// Opt-in wrapper enabling `+` composition of layers.
#[derive(Clone, Copy, Debug)]
pub struct Policy<L>(pub L);

impl<S, L> Layer<S> for Policy<L>
where
    L: Layer<S>,
{
    type Service = L::Service;

    fn layer(&self, service: S) -> Self::Service {
        self.0.layer(service)
    }
}

/// `outer(inner(service))`, produced by `Policy(outer) + Policy(inner)`.
#[derive(Clone, Copy, Debug)]
pub struct CombinedLayer<A, B> {
    pub outer: A,
    pub inner: B,
}

impl<A, B> Add<Policy<B>> for Policy<A> {
    type Output = Policy<CombinedLayer<A, B>>;

    fn add(self, rhs: Policy<B>) -> Self::Output {
        Policy(CombinedLayer { outer: self.0, inner: rhs.0 })
    }
}

impl<S, A, B> Layer<S> for CombinedLayer<A, B>
where
    B: Layer<S>,
    A: Layer<B::Service>,
{
    type Service = A::Service;

    fn layer(&self, service: S) -> Self::Service {
        self.outer.layer(self.inner.layer(service))
    }
}
