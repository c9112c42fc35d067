//! Retry policy implementation
//!
//! Semantics:
//! - `max_attempts` counts total attempts (initial try + retries); `0` is treated as `1`,
//!   so the operation is always tried at least once.
//! - Attempts run strictly one after another; the next starts only after the previous
//!   one has settled.
//! - A success returns immediately. A failure on the final attempt is returned unchanged.
//! - Between attempts the policy waits `backoff.delay_after(attempt)`, linear by default.
//! - `should_retry` can stop early for failures not worth repeating. The default retries
//!   every failure kind alike, timeouts and 4xx responses included.
//! - There is no deadline across attempts; wrap each attempt in a
//!   [`TimeoutPolicy`](crate::TimeoutPolicy) to bound it.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use apiguard::{RequestError, RetryPolicy};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(3)
//!     .base_delay(Duration::from_millis(10))
//!     .build();
//! let result: Result<(), RequestError> =
//!     policy.execute(|| async { Err(RequestError::transport("connection refused")) }).await;
//! assert_eq!(result.unwrap_err().message(), "connection refused");
//! # });
//! ```

use crate::{Backoff, InstantSleeper, Outcome, RequestError, Sleeper, TokioSleeper};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::ServiceExt;
use tower_layer::Layer;
use tower_service::Service;
use tracing::{debug, warn};

/// Total attempts used when the caller does not choose.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

type RetryPredicate = Arc<dyn Fn(&RequestError) -> bool + Send + Sync>;

/// Bounded, sequential retry with backoff.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff: Backoff,
    should_retry: RetryPredicate,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("sleeper", &self.sleeper)
            .field("should_retry", &"<predicate>")
            .finish()
    }
}

/// Bookkeeping for one `execute` call.
#[derive(Debug, Default)]
struct RetryState {
    attempt: usize,
    last_error: Option<RequestError>,
}

impl RetryState {
    fn record(&mut self, error: RequestError) {
        self.attempt += 1;
        self.last_error = Some(error);
    }

    fn into_error(self) -> RequestError {
        let attempts = self.attempt;
        match self.last_error {
            Some(error) => {
                warn!(attempts, error = %error, "request failed");
                error
            }
            None => RequestError::transport("request was never attempted"),
        }
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Total attempts, always at least one.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Run `operation` until it succeeds, a failure is not retryable, or attempts run out.
    pub async fn execute<T, Fut, Op>(&self, mut operation: Op) -> Outcome<T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let mut state = RetryState::default();

        while state.attempt < self.max_attempts {
            let attempt = state.attempt;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let retryable = (self.should_retry)(&error);
            state.record(error);
            if !retryable || state.attempt >= self.max_attempts {
                break;
            }

            let delay = self.backoff.delay_after(attempt);
            debug!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = ?state.last_error,
                "attempt failed, backing off"
            );
            self.sleeper.sleep(delay).await;
        }

        Err(state.into_error())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicyBuilder::new().build()
    }
}

/// Builder for [`RetryPolicy`].
pub struct RetryPolicyBuilder {
    max_attempts: usize,
    backoff: Backoff,
    should_retry: RetryPredicate,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryPolicyBuilder {
    /// Three attempts, linear backoff from one second, every failure retried.
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
            should_retry: Arc::new(|_| true),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Total attempts (initial + retries). `0` behaves like `1`.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Linear backoff starting at `base`.
    pub fn base_delay(mut self, base: Duration) -> Self {
        self.backoff = Backoff::linear(base);
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Decide per failure whether another attempt is worthwhile.
    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Skip backoff waits entirely.
    pub fn without_waiting(self) -> Self {
        self.with_sleeper(InstantSleeper)
    }

    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            backoff: self.backoff,
            should_retry: self.should_retry,
            sleeper: self.sleeper,
        }
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tower layer applying a [`RetryPolicy`]; requests are cloned per attempt.
#[derive(Debug, Clone)]
pub struct RetryLayer {
    policy: RetryPolicy,
}

impl RetryLayer {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService { inner, policy: self.policy.clone() }
    }
}

/// Service produced by [`RetryLayer`].
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S, Request> Service<Request> for RetryService<S>
where
    Request: Clone + Send + 'static,
    S: Service<Request, Error = RequestError> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = RequestError;
    type Future = BoxFuture<'static, Outcome<S::Response>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let policy = self.policy.clone();
        let inner = self.inner.clone();
        Box::pin(async move {
            let attempt = move || {
                let service = inner.clone();
                let request = request.clone();
                async move { service.oneshot(request).await }
            };
            policy.execute(attempt).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, TrackingSleeper};
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn failing(counter: &Arc<AtomicUsize>) -> impl FnMut() -> BoxFuture<'static, Outcome<u32>> {
        let counter = counter.clone();
        move || {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(RequestError::status(503, format!("attempt {attempt}")))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn success_first_attempt() {
        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::builder().with_sleeper(sleeper.clone()).build();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, RequestError>(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only execute once");
        assert_eq!(sleeper.count(), 0, "success must not wait");
    }

    #[tokio::test]
    async fn always_failing_runs_max_attempts_and_returns_last_failure() {
        let policy = RetryPolicy::builder().max_attempts(3).without_waiting().build();
        let counter = Arc::new(AtomicUsize::new(0));

        let err = policy.execute(failing(&counter)).await.unwrap_err();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(err.message(), "attempt 2");
        assert_eq!(err.status_code(), Some(503));
    }

    #[tokio::test]
    async fn fail_once_then_succeed() {
        let policy = RetryPolicy::builder().max_attempts(3).without_waiting().build();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(RequestError::transport("connection reset"))
                    } else {
                        Ok("recovered")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn single_attempt_never_waits() {
        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::builder().max_attempts(1).with_sleeper(sleeper.clone()).build();
        let counter = Arc::new(AtomicUsize::new(0));

        let err = policy.execute(failing(&counter)).await.unwrap_err();

        assert_eq!(err.message(), "attempt 0");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy::builder().max_attempts(0).without_waiting().build();
        assert_eq!(policy.max_attempts(), 1);

        let counter = Arc::new(AtomicUsize::new(0));
        let err = policy.execute(failing(&counter)).await.unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(err.message(), "attempt 0");

        let ok = policy.execute(|| async { Ok::<_, RequestError>(5) }).await;
        assert_eq!(ok.unwrap(), 5);
    }

    #[tokio::test]
    async fn waits_grow_linearly() {
        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::builder()
            .max_attempts(4)
            .base_delay(Duration::from_millis(1_000))
            .with_sleeper(sleeper.clone())
            .build();

        let _ = policy.execute(failing(&Arc::new(AtomicUsize::new(0)))).await;

        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(3)],
            "one wait between each pair of attempts, none after the last"
        );
    }

    #[tokio::test]
    async fn default_policy_matches_documented_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.backoff().base(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn timeouts_are_retried_like_any_failure() {
        let policy = RetryPolicy::builder().max_attempts(2).without_waiting().build();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let err = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(RequestError::timeout("request timed out after 50ms"))
                }
            })
            .await
            .unwrap_err();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn predicate_can_stop_on_client_errors() {
        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::builder()
            .max_attempts(5)
            .should_retry(|e| !e.is_client_error())
            .with_sleeper(sleeper.clone())
            .build();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let err = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(RequestError::status(401, "unauthorized"))
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(401));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::builder()
            .max_attempts(4)
            .base_delay(Duration::from_millis(10))
            .build();

        let _ = policy
            .execute(|| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Err::<(), _>(RequestError::transport("refused"))
                }
            })
            .await;

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn layer_retries_inner_service() {
        use tower::{service_fn, ServiceBuilder};

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let svc = ServiceBuilder::new()
            .layer(RetryLayer::new(
                RetryPolicy::builder().max_attempts(3).without_waiting().build(),
            ))
            .service(service_fn(move |name: &'static str| {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(RequestError::status(502, "bad gateway"))
                    } else {
                        Ok(format!("hello {name}"))
                    }
                }
            }));

        assert_eq!(svc.oneshot("world").await.unwrap(), "hello world");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
