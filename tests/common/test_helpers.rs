#![allow(dead_code)]

use apiguard::{ApiClient, RetryPolicy, ScriptedTransport, TimeoutPolicy, TrackingSleeper};

/// Client over `transport` with a short deadline and recorded (not slept) backoff.
pub fn client_with(
    transport: &ScriptedTransport,
    timeout_ms: u64,
    max_attempts: usize,
) -> (ApiClient<ScriptedTransport>, TrackingSleeper) {
    let sleeper = TrackingSleeper::new();
    let client = ApiClient::new(transport.clone())
        .with_timeout(TimeoutPolicy::from_millis(timeout_ms).expect("non-zero timeout"))
        .with_retry(
            RetryPolicy::builder().max_attempts(max_attempts).with_sleeper(sleeper.clone()).build(),
        );
    (client, sleeper)
}
