//! Multipart upload through the client, plus how failures surface.
use apiguard::prelude::*;
use apiguard::ScriptedTransport;
use serde_json::{json, Value};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let transport = ScriptedTransport::new();
    transport
        .push_json(201, json!({ "id": "att_1", "size": 11 }))
        .push_json(413, json!({ "error": "file too large" }));

    let client = ApiClient::new(transport);
    let form = FormPayload::new()
        .text("project", "42")
        .file_with_type("file", "notes.txt", "text/plain", b"hello world".to_vec());

    let descriptor = RequestDescriptor::post("/attachments");

    let created: Value = match client.upload(&descriptor, form.clone()).await {
        Ok(body) => body,
        Err(err) => {
            eprintln!("upload failed: {err}");
            return;
        }
    };
    println!("uploaded: {created}");

    if let Err(err) = client.upload::<Value>(&descriptor, form).await {
        println!("rejected ({:?}, status {:?}): {err}", err.kind(), err.status_code());
    }
}
