//! Retry and timeout as tower layers, composed in both orders.
use apiguard::prelude::*;
use apiguard::ScriptedTransport;
use serde_json::json;
use std::time::Duration;
use tower::{ServiceBuilder, ServiceExt};

fn executor() -> RequestExecutor<ScriptedTransport> {
    let transport = ScriptedTransport::new();
    transport.push_hang().push_json(200, json!({ "ok": true }));
    RequestExecutor::new(transport)
}

fn retry() -> Policy<RetryLayer> {
    Policy(RetryLayer::new(
        RetryPolicy::builder().max_attempts(2).base_delay(Duration::from_millis(50)).build(),
    ))
}

fn timeout() -> Policy<TimeoutLayer> {
    Policy(TimeoutLayer::new(Duration::from_millis(200)).expect("valid timeout"))
}

#[tokio::main]
async fn main() {
    // Each attempt gets its own window, so the hung first attempt is retried.
    let per_attempt = ServiceBuilder::new().layer(retry() + timeout()).service(executor());
    match per_attempt.oneshot(RequestDescriptor::get("/health")).await {
        Ok(body) => println!("retry(timeout(executor)): {body}"),
        Err(err) => println!("retry(timeout(executor)) failed: {err}"),
    }

    // One window covers every attempt, so the hang exhausts it.
    let overall = ServiceBuilder::new().layer(timeout() + retry()).service(executor());
    match overall.oneshot(RequestDescriptor::get("/health")).await {
        Ok(body) => println!("timeout(retry(executor)): {body}"),
        Err(err) => println!("timeout(retry(executor)) failed: {err}"),
    }
}
