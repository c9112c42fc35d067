//! `reqwest`-backed transport.

use super::{Transport, TransportBody, TransportError, TransportRequest, TransportResponse};
use crate::descriptor::{FormPart, FormPayload};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Production transport over a shared `reqwest::Client`.
///
/// Connection reuse is whatever the wrapped client does; this type adds nothing on top.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

fn multipart(payload: FormPayload) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in payload.parts().iter().cloned() {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File { name, file_name, content_type, bytes } => {
                let mut file = Part::bytes(bytes).file_name(file_name);
                if let Some(content_type) = content_type {
                    file = file.mime_str(&content_type)?;
                }
                form.part(name, file)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let TransportRequest { method, url, headers, body } = request;
        let mut builder = self.client.request(method, url).headers(headers);
        builder = match body {
            TransportBody::Empty => builder,
            TransportBody::Bytes(bytes) => builder.body(bytes),
            TransportBody::Form(payload) => builder.multipart(multipart(payload)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        // Status and headers have arrived; a body that fails to arrive is an unreadable body,
        // not a failed round trip.
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                debug!(status = status.as_u16(), error = %err, "response body could not be read");
                Vec::new()
            }
        };
        Ok(TransportResponse::from_parts(status, headers, body))
    }
}
