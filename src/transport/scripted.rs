//! Scripted transport for tests and demos.
//!
//! Outcomes are consumed in FIFO order, one per `send`. When the script runs dry the
//! fallback outcome (if any) is replayed, otherwise the call fails with a transport error.

use super::{Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use http::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Step {
    Respond { response: TransportResponse, latency: Option<Duration> },
    Fail(TransportError),
    Hang,
}

#[derive(Debug, Default)]
struct Script {
    steps: VecDeque<Step>,
    fallback: Option<Step>,
    requests: Vec<TransportRequest>,
}

/// Transport that replays canned outcomes and records every request it receives.
///
/// Clones share the same script, so a test can keep one handle for assertions while the
/// executor owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that answers every call with `response`.
    pub fn always(response: TransportResponse) -> Self {
        let transport = Self::new();
        transport.lock().fallback = Some(Step::Respond { response, latency: None });
        transport
    }

    /// Transport whose calls never settle.
    pub fn hanging() -> Self {
        let transport = Self::new();
        transport.lock().fallback = Some(Step::Hang);
        transport
    }

    pub fn push_response(&self, response: TransportResponse) -> &Self {
        self.push(Step::Respond { response, latency: None })
    }

    /// Queue a response delivered after `latency`.
    pub fn push_delayed(&self, response: TransportResponse, latency: Duration) -> &Self {
        self.push(Step::Respond { response, latency: Some(latency) })
    }

    pub fn push_json(&self, status: u16, value: serde_json::Value) -> &Self {
        self.push_response(TransportResponse::json(status_code(status), &value))
    }

    /// Queue a response with a raw, possibly non-JSON body.
    pub fn push_raw(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.push_response(TransportResponse::new(status_code(status), body))
    }

    /// Queue a failed round trip.
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.push(Step::Fail(TransportError::new(message)))
    }

    /// Queue a call that never settles.
    pub fn push_hang(&self) -> &Self {
        self.push(Step::Hang)
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.lock().requests.clone()
    }

    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    fn push(&self, step: Step) -> &Self {
        self.lock().steps.push_back(step);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not wedge the remaining assertions.
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let step = {
            let mut script = self.lock();
            script.requests.push(request);
            script.steps.pop_front().or_else(|| script.fallback.clone())
        };

        match step {
            Some(Step::Respond { response, latency }) => {
                if let Some(latency) = latency {
                    tokio::time::sleep(latency).await;
                }
                Ok(response)
            }
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(TransportError::new("scripted transport has no response queued")),
        }
    }
}
