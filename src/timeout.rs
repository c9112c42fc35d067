//! Timeout policy implementation
//!
//! [`TimeoutPolicy::execute`] races an operation against a deadline and returns a
//! [`Timeout`] future, an explicit two-way race:
//!
//! ```text
//! Pending ──operation settles──▶ SettledByOperation   (its outcome, win or lose)
//!    └─────deadline elapses────▶ SettledByTimer       (ErrorKind::Timeout)
//! ```
//!
//! Settlement happens once. Both the operation and the deadline are dropped at that
//! moment, so a late second signal has nothing left to report, and dropping the operation
//! cancels the in-flight transport call. A settled `Timeout` is fused: polling it again
//! returns `Poll::Pending`.
//!
//! The deadline starts when the `Timeout` is created, which must happen inside a tokio
//! runtime.

use crate::{Outcome, RequestError};
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Sleep;
use tower_layer::Layer;
use tower_service::Service;
use tracing::warn;

/// Deadline applied when the caller does not choose one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Invalid timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    #[error("timeout duration must be greater than zero")]
    ZeroDuration,
}

/// Per-attempt deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    duration: Duration,
}

impl TimeoutPolicy {
    pub fn new(duration: Duration) -> Result<Self, TimeoutError> {
        if duration.is_zero() {
            return Err(TimeoutError::ZeroDuration);
        }
        Ok(Self { duration })
    }

    pub fn from_millis(millis: u64) -> Result<Self, TimeoutError> {
        Self::new(Duration::from_millis(millis))
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start `operation` and race it against this policy's deadline.
    pub fn execute<Fut, Op>(&self, operation: Op) -> Timeout<Fut>
    where
        Op: FnOnce() -> Fut,
        Fut: Future,
    {
        Timeout::new(operation(), self.duration)
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self { duration: DEFAULT_TIMEOUT }
    }
}

/// Progress of a [`Timeout`] race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    Pending,
    SettledByOperation,
    SettledByTimer,
}

/// Future returned by [`TimeoutPolicy::execute`].
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct Timeout<F> {
    #[pin]
    operation: Option<F>,
    #[pin]
    deadline: Option<Sleep>,
    limit: Duration,
    state: RaceState,
}

impl<F> Timeout<F> {
    fn new(operation: F, limit: Duration) -> Self {
        Self {
            operation: Some(operation),
            deadline: Some(tokio::time::sleep(limit)),
            limit,
            state: RaceState::Pending,
        }
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl<F, T> Future for Timeout<F>
where
    F: Future<Output = Outcome<T>>,
{
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        if *this.state != RaceState::Pending {
            return Poll::Pending;
        }

        // The operation is polled first so a result that is ready at the deadline wins.
        if let Some(operation) = this.operation.as_mut().as_pin_mut() {
            if let Poll::Ready(outcome) = operation.poll(cx) {
                *this.state = RaceState::SettledByOperation;
                this.operation.set(None);
                this.deadline.set(None);
                return Poll::Ready(outcome);
            }
        }

        if let Some(deadline) = this.deadline.as_mut().as_pin_mut() {
            if deadline.poll(cx).is_ready() {
                *this.state = RaceState::SettledByTimer;
                this.operation.set(None);
                this.deadline.set(None);
                let timeout_ms = u64::try_from(this.limit.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "request deadline elapsed, abandoning attempt");
                return Poll::Ready(Err(RequestError::timeout(format!(
                    "request timed out after {timeout_ms}ms"
                ))));
            }
        }

        Poll::Pending
    }
}

/// Tower layer applying a [`TimeoutPolicy`] to every call.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    policy: TimeoutPolicy,
}

impl TimeoutLayer {
    pub fn new(duration: Duration) -> Result<Self, TimeoutError> {
        Ok(Self { policy: TimeoutPolicy::new(duration)? })
    }

    pub fn from_policy(policy: TimeoutPolicy) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService { inner, policy: self.policy }
    }
}

/// Service produced by [`TimeoutLayer`].
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    policy: TimeoutPolicy,
}

impl<S, Request> Service<Request> for TimeoutService<S>
where
    S: Service<Request, Error = RequestError>,
{
    type Response = S::Response;
    type Error = RequestError;
    type Future = Timeout<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        self.policy.execute(|| future)
    }
}
