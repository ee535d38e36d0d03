//! Chat streaming tests against a mock backend using wiremock.
//!
//! These tests verify that `/rag/chat` requests are shaped correctly and that
//! the event stream is folded into conversation turns.

use ibot::client::{ClientError, DriveOutcome, IbotClient};
use ibot::error::{NetworkError, StreamError};
use ibot::models::{ChatRequest, TurnStatus};
use ibot::session::ChatSession;
use ibot::sse::{SourceDocument, StreamEvent};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build an event-stream body from JSON payloads.
fn sse_body(events: &[&str]) -> String {
    events
        .iter()
        .map(|e| format!("data: {}\n\n", e))
        .collect()
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

async fn mount_chat(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_answer_with_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .and(header("accept", "text/event-stream"))
        .and(body_json(serde_json::json!({
            "knowledge_base_id": 3,
            "query": "What is the grid emission factor?",
            "k": 5
        })))
        .respond_with(sse_response(sse_body(&[
            r#"{"type":"search_complete","doc_count":2}"#,
            r#"{"type":"token","content":"The factor "}"#,
            r#"{"type":"token","content":"is 0.5703."}"#,
            r#"{"type":"sources","documents":[{"id":11,"name":"guide.pdf"},{"id":12,"name":""}]}"#,
            r#"{"type":"done"}"#,
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let mut seen = Vec::new();
    let (id, outcome) = session
        .send("What is the grid emission factor?", |event, _| {
            seen.push(event.event_type_name().to_string())
        })
        .await
        .unwrap();

    assert_eq!(outcome, DriveOutcome::Finished);
    assert_eq!(seen, vec!["search_complete", "token", "token", "sources", "done"]);

    let turn = session.turn(id).unwrap();
    assert_eq!(turn.text, "The factor is 0.5703.");
    assert_eq!(turn.status, TurnStatus::Done);
    let sources = turn.sources.as_ref().unwrap();
    assert_eq!(sources[0], SourceDocument::new(11, "guide.pdf"));
    assert_eq!(sources[1].download_name(), "document_12.pdf");
}

#[tokio::test]
async fn test_top_k_is_sent_as_k() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .and(body_json(serde_json::json!({
            "knowledge_base_id": 1,
            "query": "hi",
            "k": 9
        })))
        .respond_with(sse_response(sse_body(&[r#"{"type":"done"}"#])))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 1).with_top_k(9);
    let (id, _) = session.send("hi", |_, _| {}).await.unwrap();
    assert_eq!(session.turn(id).unwrap().status, TurnStatus::Done);
}

#[tokio::test]
async fn test_backend_error_event_fails_turn() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        sse_response(sse_body(&[
            r#"{"type":"token","content":"Partial"}"#,
            r#"{"type":"error","error":"Knowledge base has no parsed documents"}"#,
            r#"{"type":"token","content":" ignored"}"#,
        ])),
    )
    .await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let (id, _) = session.send("anything", |_, _| {}).await.unwrap();

    let turn = session.turn(id).unwrap();
    assert_eq!(turn.text, "Partial");
    assert_eq!(
        turn.status,
        TurnStatus::Failed(StreamError::application(
            "Knowledge base has no parsed documents"
        ))
    );
    assert!(!turn.error().unwrap().is_transport());
}

#[tokio::test]
async fn test_error_event_without_message() {
    let server = MockServer::start().await;
    mount_chat(&server, sse_response(sse_body(&[r#"{"type":"error"}"#]))).await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let (id, _) = session.send("anything", |_, _| {}).await.unwrap();

    let err = session.turn(id).unwrap().error().unwrap();
    assert_eq!(err.user_message(), "Unknown error");
}

#[tokio::test]
async fn test_stream_closed_without_done() {
    let server = MockServer::start().await;
    // Last segment has no trailing separator
    let body = "data: {\"type\":\"token\",\"content\":\"Hello\"}\n\ndata: {\"type\":\"token\",\"content\":\" world\"}";
    mount_chat(&server, sse_response(body.to_string())).await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let (id, outcome) = session.send("hi", |_, _| {}).await.unwrap();

    assert_eq!(outcome, DriveOutcome::Finished);
    let turn = session.turn(id).unwrap();
    assert_eq!(turn.text, "Hello world");
    assert_eq!(turn.status, TurnStatus::Closed);
    assert!(turn.sources.is_none());
}

#[tokio::test]
async fn test_malformed_segments_are_skipped() {
    let server = MockServer::start().await;
    let body = [
        "data: {\"type\":\"token\",\"content\":\"a\"}\n\n",
        ": keep-alive\n\n",
        "data: {not json}\n\n",
        "data: {\"content\":\"no type\"}\n\n",
        "data: {\"type\":\"heartbeat\"}\n\n",
        "data: {\"type\":\"token\",\"content\":\"b\"}\n\n",
        "data: {\"type\":\"done\"}\n\n",
    ]
    .concat();
    mount_chat(&server, sse_response(body)).await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let (id, _) = session.send("hi", |_, _| {}).await.unwrap();

    let turn = session.turn(id).unwrap();
    assert_eq!(turn.text, "ab");
    assert_eq!(turn.status, TurnStatus::Done);
}

#[tokio::test]
async fn test_multibyte_answer() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        sse_response(sse_body(&[
            r#"{"type":"token","content":"排放因子为"}"#,
            r#"{"type":"token","content":"0.5703 tCO₂/MWh"}"#,
            r#"{"type":"done"}"#,
        ])),
    )
    .await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let (id, _) = session.send("电网排放因子？", |_, _| {}).await.unwrap();
    assert_eq!(session.turn(id).unwrap().text, "排放因子为0.5703 tCO₂/MWh");
}

#[tokio::test]
async fn test_server_error_fails_turn_as_transport() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(500).set_body_string("internal failure"),
    )
    .await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let mut observed = 0;
    let (id, outcome) = session.send("hi", |_, _| observed += 1).await.unwrap();

    assert_eq!(outcome, DriveOutcome::Finished);
    assert_eq!(observed, 0);
    match &session.turn(id).unwrap().status {
        TurnStatus::Failed(StreamError::Transport(NetworkError::HttpStatus { status, message })) => {
            assert_eq!(*status, 500);
            assert_eq!(message, "internal failure");
        }
        other => panic!("Expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_turns_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .and(body_json(serde_json::json!({"knowledge_base_id": 3, "query": "first", "k": 5})))
        .respond_with(sse_response(sse_body(&[
            r#"{"type":"token","content":"one"}"#,
            r#"{"type":"done"}"#,
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .and(body_json(serde_json::json!({"knowledge_base_id": 3, "query": "second", "k": 5})))
        .respond_with(sse_response(sse_body(&[
            r#"{"type":"error","error":"quota exceeded"}"#,
        ])))
        .mount(&server)
        .await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let (first, _) = session.send("first", |_, _| {}).await.unwrap();
    let (second, _) = session.send("second", |_, _| {}).await.unwrap();

    assert_eq!(session.conversation().len(), 2);
    assert_eq!(session.conversation().open_turn_count(), 0);
    assert_eq!(session.turn(first).unwrap().text, "one");
    assert_eq!(session.turn(first).unwrap().status, TurnStatus::Done);
    assert!(session.turn(second).unwrap().error().is_some());
    assert_eq!(session.conversation().exchange(second).unwrap().query, "second");
}

#[tokio::test]
async fn test_empty_query_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .respond_with(sse_response(String::new()))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = ChatSession::new(IbotClient::with_base_url(server.uri()), 3);
    let result = session.send("", |_, _| {}).await;
    assert!(matches!(result, Err(ClientError::InvalidInput(_))));
}

#[tokio::test]
async fn test_chat_stream_next_event() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        sse_response(sse_body(&[
            r#"{"type":"token","content":"x"}"#,
            r#"{"type":"sources"}"#,
            r#"{"type":"done"}"#,
        ])),
    )
    .await;

    let client = IbotClient::with_base_url(server.uri());
    let mut stream = client.chat(&ChatRequest::new(3, "q")).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event.unwrap());
    }
    assert_eq!(
        events,
        vec![
            StreamEvent::Token {
                content: "x".to_string()
            },
            StreamEvent::Sources {
                documents: Vec::new()
            },
            StreamEvent::Done,
        ]
    );
    assert!(stream.is_finished());
}

#[tokio::test]
async fn test_chat_request_rejected_by_status() {
    let server = MockServer::start().await;
    mount_chat(&server, ResponseTemplate::new(404)).await;

    let client = IbotClient::with_base_url(server.uri());
    let result = client.chat(&ChatRequest::new(3, "q")).await;

    match result {
        Err(ClientError::Network(NetworkError::HttpStatus { status, message })) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("Expected HttpStatus error, got {:?}", other),
    }
}
