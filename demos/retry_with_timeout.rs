//! Retry around a per-attempt timeout, against a scripted API.
//!
//! The first attempt hangs and is abandoned at the deadline, the second gets a 503,
//! the third succeeds. Run with `RUST_LOG=debug` to see each attempt.
use apiguard::prelude::*;
use apiguard::ScriptedTransport;
use serde_json::{json, Value};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RequestError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let transport = ScriptedTransport::new();
    transport
        .push_hang()
        .push_json(503, json!({ "message": "maintenance window" }))
        .push_json(200, json!({ "projects": [{ "id": 1, "name": "apiguard" }] }));

    let client = ApiClient::new(transport.clone())
        .with_timeout(TimeoutPolicy::from_millis(250).expect("valid timeout"))
        .with_retry(
            RetryPolicy::builder()
                .max_attempts(3)
                .base_delay(Duration::from_millis(100))
                .build(),
        );

    let body: Value = client.get("/projects").await?;

    println!("after {} attempts: {body}", transport.calls());
    Ok(())
}
