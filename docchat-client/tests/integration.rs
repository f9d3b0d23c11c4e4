//! Integration tests for the docchat client using wiremock.

use std::time::Duration;

use docchat_client::{CHAT_REQUEST_FAILED, ChatUpdate, DocChat, StreamState};
use docchat_types::{ApiError, ChatRequest, MessageStatus, Role};
use futures::StreamExt;
use wiremock::matchers::{body_json, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("data: {l}\n\n")).collect()
}

fn document_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "filename": "lease.pdf",
        "file_type": "pdf",
        "file_size": 2048,
        "page_count": 3,
        "chunk_count": 12,
        "created_at": "2024-05-01T10:00:00+00:00"
    })
}

fn conversation_json(id: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "created_at": "2024-05-01T10:00:00+00:00",
        "updated_at": "2024-05-01T10:00:00+00:00",
        "message_count": 0
    })
}

// ─── Chat stream ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_posts_request_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(serde_json::json!({
            "conversation_id": "conv-1",
            "message": "What is the notice period?",
            "document_ids": ["doc-1", "doc-2"]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&[r#"{"type":"done"}"#]), "text/event-stream"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let request = ChatRequest::new("conv-1", "What is the notice period?")
        .with_documents(["doc-1", "doc-2"]);
    let message = client.send_message(request).finish().await;

    assert_eq!(message.status, MessageStatus::Completed);
}

#[tokio::test]
async fn chat_streams_tokens_and_citations() {
    let mock_server = MockServer::start().await;

    let body = sse_body(&[
        r#"{"type":"token","content":"The notice period is "}"#,
        r#"{"type":"token","content":"30 days [1]."}"#,
        r#"{"type":"citations","citations":[{"number":1,"document_id":"doc-1","filename":"lease.pdf","content":"Either party may terminate on thirty days notice.","page_number":2,"section":"Termination","chunk_id":"chunk-9"}]}"#,
        r#"{"type":"done"}"#,
    ]);

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let stream = client.send_message(ChatRequest::new("conv-1", "notice?"));
    let updates: Vec<ChatUpdate> = stream.collect().await;

    assert_eq!(updates.len(), 4);
    assert_eq!(updates[0], ChatUpdate::Token("The notice period is ".into()));
    assert_eq!(updates[1], ChatUpdate::Token("30 days [1].".into()));
    let ChatUpdate::Citations(citations) = &updates[2] else {
        panic!("expected Citations, got {:?}", updates[2]);
    };
    assert_eq!(citations[0].location(), "lease.pdf, Termination, page 2");
    let ChatUpdate::Finished(message) = &updates[3] else {
        panic!("expected Finished");
    };
    assert_eq!(message.content, "The notice period is 30 days [1].");
    assert_eq!(message.citations.as_ref().map(Vec::len), Some(1));
    assert_eq!(message.status, MessageStatus::Completed);
}

#[tokio::test]
async fn chat_error_status_surfaces_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({ "detail": "overloaded" })),
        )
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let mut stream = client.send_message(ChatRequest::new("conv-1", "hi"));
    let mut states = stream.watch_state();

    let mut updates = Vec::new();
    while let Some(update) = stream.next().await {
        updates.push(update);
    }

    assert_eq!(updates.len(), 1);
    let ChatUpdate::Finished(message) = &updates[0] else {
        panic!("expected Finished");
    };
    assert_eq!(message.status, MessageStatus::Errored("overloaded".into()));
    assert_eq!(message.content, "");
    assert_eq!(*states.borrow_and_update(), StreamState::Errored);
}

#[tokio::test]
async fn chat_error_without_detail_uses_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let message = client
        .send_message(ChatRequest::new("conv-1", "hi"))
        .finish()
        .await;

    assert_eq!(
        message.status,
        MessageStatus::Errored(CHAT_REQUEST_FAILED.into())
    );
}

#[tokio::test]
async fn chat_skips_malformed_lines() {
    let mock_server = MockServer::start().await;

    let body = format!(
        ": keep-alive\n\ndata: {{not json\n\n{}",
        sse_body(&[
            r#"{"type":"usage","tokens":12}"#,
            r#"{"type":"token","content":"ok"}"#,
            r#"{"type":"done"}"#,
        ])
    );

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let message = client
        .send_message(ChatRequest::new("conv-1", "hi"))
        .finish()
        .await;

    assert_eq!(message.content, "ok");
    assert_eq!(message.status, MessageStatus::Completed);
}

#[tokio::test]
async fn chat_timeout_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&[r#"{"type":"done"}"#]), "text/event-stream")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri()).timeout(Duration::from_millis(50));
    let message = client
        .send_message(ChatRequest::new("conv-1", "hi"))
        .finish()
        .await;

    assert!(
        matches!(&message.status, MessageStatus::Errored(e) if e.contains("timeout")),
        "expected timeout error, got {:?}",
        message.status
    );
}

#[tokio::test]
async fn chat_connection_refused_is_an_error() {
    // Port 9 (discard) is not listening on loopback in test environments.
    let client = DocChat::new("http://127.0.0.1:9");
    let stream = client.send_message(ChatRequest::new("conv-1", "hi"));
    let states = stream.watch_state();
    let message = stream.finish().await;

    assert!(matches!(message.status, MessageStatus::Errored(ref e) if !e.is_empty()));
    assert_eq!(*states.borrow(), StreamState::Errored);
}

#[tokio::test]
async fn chat_cancel_during_slow_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&[r#"{"type":"done"}"#]), "text/event-stream")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let stream = client.send_message(ChatRequest::new("conv-1", "hi"));
    let handle = stream.cancel_handle();

    let reader = tokio::spawn(stream.finish());
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let message = tokio::time::timeout(Duration::from_secs(2), reader)
        .await
        .expect("cancelled stream should finish promptly")
        .unwrap();
    assert_eq!(message.status, MessageStatus::Cancelled);
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_documents_parses_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([document_json("d1"), document_json("d2")])),
        )
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let docs = client.list_documents().await.unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "d1");
    assert_eq!(docs[0].page_count, Some(3));
}

#[tokio::test]
async fn upload_document_sends_multipart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json("d9")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let doc = client
        .upload_document("lease.pdf", b"%PDF-1.7".to_vec())
        .await
        .unwrap();

    assert_eq!(doc.id, "d9");
}

#[tokio::test]
async fn upload_rejection_surfaces_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "detail": "Only PDF and DOCX files are supported"
        })))
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let err = client
        .upload_document("notes.txt", b"hello".to_vec())
        .await
        .unwrap_err();

    assert!(
        matches!(&err, ApiError::Status { status: 400, detail } if detail == "Only PDF and DOCX files are supported"),
        "unexpected error: {err:?}"
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn create_document_from_text_posts_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/documents/from-text"))
        .and(body_json(serde_json::json!({
            "content": "Draft motion",
            "filename": "motion.pdf"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json("d3")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let doc = client
        .create_document_from_text("Draft motion", "motion.pdf")
        .await
        .unwrap();
    assert_eq!(doc.id, "d3");
}

#[tokio::test]
async fn delete_document_checks_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/documents/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status":"deleted"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/documents/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"detail":"Document not found"})),
        )
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    client.delete_document("d1").await.unwrap();
    let err = client.delete_document("missing").await.unwrap_err();
    assert_eq!(err.message(), "Document not found");
}

// ─── Conversations ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_conversation_uses_default_title() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .and(body_json(serde_json::json!({ "title": "New Conversation" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(conversation_json("c1", "New Conversation")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let conv = client.create_conversation(None).await.unwrap();
    assert_eq!(conv.id, "c1");
    assert_eq!(conv.message_count, 0);
}

#[tokio::test]
async fn get_conversation_decodes_stored_citations() {
    let mock_server = MockServer::start().await;

    let citations = serde_json::json!([{
        "number": 1, "document_id": "d1", "filename": "lease.pdf", "content": "excerpt",
        "page_number": null, "section": null, "chunk_id": "k1"
    }])
    .to_string();

    Mock::given(method("GET"))
        .and(path("/api/conversations/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "c1",
            "title": "Lease review",
            "messages": [
                {"id": "m1", "role": "user", "content": "notice?", "citations": null, "created_at": "2024-05-01T10:00:00"},
                {"id": "m2", "role": "assistant", "content": "30 days [1]", "citations": citations, "created_at": "2024-05-01T10:00:01"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let detail = client.get_conversation("c1").await.unwrap();

    assert_eq!(detail.messages.len(), 2);
    assert_eq!(detail.messages[0].role, Role::User);
    assert_eq!(detail.messages[0].parsed_citations(), None);
    let cited = detail.messages[1].parsed_citations().unwrap();
    assert_eq!(cited[0].chunk_id, "k1");
}

#[tokio::test]
async fn rename_and_list_conversations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/conversations/c1"))
        .and(body_json(serde_json::json!({ "title": "Lease review" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(conversation_json("c1", "Lease review")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([conversation_json("c1", "Lease review")])),
        )
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let renamed = client.rename_conversation("c1", "Lease review").await.unwrap();
    assert_eq!(renamed.title, "Lease review");

    let all = client.list_conversations().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn delete_missing_conversation_is_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/conversations/nope"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"detail":"Conversation not found"})),
        )
        .mount(&mock_server)
        .await;

    let client = DocChat::new(mock_server.uri());
    let err = client.delete_conversation("nope").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
    assert_eq!(err.message(), "Conversation not found");
}
