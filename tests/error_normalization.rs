use apiguard::{ErrorKind, RequestDescriptor, RequestExecutor, ScriptedTransport};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, PartialEq)]
struct Project {
    id: u64,
    name: String,
}

fn executor(transport: &ScriptedTransport) -> RequestExecutor<ScriptedTransport> {
    RequestExecutor::new(transport.clone()).with_base_url("https://api.example.test")
}

#[tokio::test]
async fn success_decodes_typed_body() {
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({ "id": 7, "name": "dashboard" }));

    let project: Project =
        executor(&transport).execute(&RequestDescriptor::get("/projects/7")).await.unwrap();

    assert_eq!(project, Project { id: 7, name: "dashboard".into() });
    assert_eq!(transport.requests()[0].url, "https://api.example.test/projects/7");
}

#[tokio::test]
async fn not_found_uses_server_error_field() {
    let transport = ScriptedTransport::new();
    transport.push_json(404, json!({ "error": "not found" }));

    let err = executor(&transport)
        .execute::<Value>(&RequestDescriptor::get("/projects"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Status);
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.message(), "not found");
    assert_eq!(err.to_string(), "not found");
}

#[tokio::test]
async fn message_field_wins_over_error_field() {
    let transport = ScriptedTransport::new();
    transport.push_json(422, json!({ "message": "name is required", "error": "invalid" }));

    let err = executor(&transport)
        .execute::<Value>(&RequestDescriptor::post("/projects").json_value(json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "name is required");
    assert_eq!(err.status_code(), Some(422));
}

#[tokio::test]
async fn non_json_failure_body_falls_back_to_status_text() {
    let transport = ScriptedTransport::new();
    transport.push_raw(500, "<html>oops</html>");

    let err = executor(&transport)
        .execute::<Value>(&RequestDescriptor::get("/projects"))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "500: Internal Server Error");
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn json_failure_body_without_message_falls_back_to_status_text() {
    let transport = ScriptedTransport::new();
    transport.push_json(503, json!({ "retry_after": 30 }));

    let err = executor(&transport)
        .execute::<Value>(&RequestDescriptor::get("/projects"))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "503: Service Unavailable");
}

#[tokio::test]
async fn transport_failure_has_no_status() {
    let transport = ScriptedTransport::new();
    transport.push_failure("connection refused");

    let err = executor(&transport)
        .execute::<Value>(&RequestDescriptor::get("/projects"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status_code(), None);
    assert!(err.message().contains("connection refused"), "got {:?}", err.message());
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_failure() {
    let transport = ScriptedTransport::new();
    transport.push_raw(200, "{ not json");

    let err = executor(&transport)
        .execute::<Value>(&RequestDescriptor::get("/projects"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn empty_no_content_body_is_a_decode_failure() {
    let transport = ScriptedTransport::new();
    transport.push_raw(204, "");

    let err = executor(&transport)
        .execute::<Value>(&RequestDescriptor::delete("/projects/1"))
        .await
        .unwrap_err();

    assert!(err.is_decode());
}

#[tokio::test]
async fn shape_mismatch_is_a_decode_failure() {
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({ "id": "seven" }));

    let err = executor(&transport)
        .execute::<Project>(&RequestDescriptor::get("/projects/7"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
}
