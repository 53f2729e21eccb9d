use std::sync::Arc;
use std::time::Duration;

use optimus::api::BackendClient;
use optimus::conversation::SUBMIT_FAILURE_NOTICE;
use optimus::{ChatSession, MessageKind, SendOutcome};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POLL: Duration = Duration::from_millis(20);

fn session_for(uri: &str) -> ChatSession {
    let client = BackendClient::new(uri, Duration::from_secs(5)).unwrap();
    ChatSession::new(Arc::new(client), POLL)
}

async fn accept_submissions(server: &MockServer, input: &str) {
    Mock::given(method("POST"))
        .and(path("/api/send-request"))
        .and(body_json(json!({ "input": input })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "request_sent" })))
        .expect(1)
        .mount(server)
        .await;
}

async fn waiting_then(server: &MockServer, waits: u64, terminal: serde_json::Value) {
    if waits > 0 {
        Mock::given(method("GET"))
            .and(path("/api/get-response"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "waiting" })))
            .up_to_n_times(waits)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/api/get-response"))
        .respond_with(ResponseTemplate::new(200).set_body_json(terminal))
        .mount(server)
        .await;
}

async fn poll_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/api/get-response")
        .count()
}

#[tokio::test]
async fn waiting_responses_then_analysis_appends_agents_in_order() {
    let server = MockServer::start().await;
    accept_submissions(&server, "Compare AAPL and MSFT").await;
    waiting_then(
        &server,
        3,
        json!({
            "status": "done",
            "analysis_result": { "analysis": [
                { "name": "A", "content": "x" },
                { "name": "B", "content": "y" }
            ]}
        }),
    )
    .await;

    let mut session = session_for(&server.uri());
    assert!(session.send("Compare AAPL and MSFT"));
    assert_eq!(session.conversation().len(), 1);

    let event = session.next_driver_event().await.unwrap();
    assert!(session.is_awaiting());
    assert_eq!(session.apply(event), SendOutcome::Completed { replies: 2 });
    assert!(!session.is_awaiting());

    let messages = session.conversation().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].kind(), MessageKind::User);
    assert_eq!((messages[1].author(), messages[1].text()), (Some("A"), "x"));
    assert_eq!((messages[2].author(), messages[2].text()), (Some("B"), "y"));
    assert_eq!(poll_count(&server).await, 4);
}

#[tokio::test]
async fn rejected_submission_shows_error_and_never_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send-request"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Financial analysis agent not available"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get-response"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "waiting" })))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri());
    session.send("hello");
    assert_eq!(session.settle().await, Some(SendOutcome::SubmitFailed));

    let messages = session.conversation().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].kind(), MessageKind::Error);
    assert_eq!(messages[1].text(), SUBMIT_FAILURE_NOTICE);

    tokio::time::sleep(POLL * 3).await;
    assert_eq!(poll_count(&server).await, 0);
}

#[tokio::test]
async fn unreachable_backend_shows_error() {
    // Nothing listens on port 1.
    let mut session = session_for("http://127.0.0.1:1");
    session.send("hello");

    assert_eq!(session.settle().await, Some(SendOutcome::SubmitFailed));
    assert_eq!(session.conversation().last().map(|m| m.kind()), Some(MessageKind::Error));
    assert!(!session.is_awaiting());
}

#[tokio::test]
async fn unreadable_poll_body_stops_silently() {
    let server = MockServer::start().await;
    accept_submissions(&server, "hello").await;
    Mock::given(method("GET"))
        .and(path("/api/get-response"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri());
    session.send("hello");
    let before = session.conversation().len();

    assert_eq!(session.settle().await, Some(SendOutcome::PollFailed));
    assert!(!session.is_awaiting());
    assert_eq!(session.conversation().len(), before);

    tokio::time::sleep(POLL * 3).await;
    assert_eq!(poll_count(&server).await, 1);
}

#[tokio::test]
async fn server_error_body_without_result_keeps_waiting() {
    let server = MockServer::start().await;
    accept_submissions(&server, "hello").await;
    Mock::given(method("GET"))
        .and(path("/api/get-response"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "agent offline" })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get-response"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "done",
            "analysis_result": { "analysis": [] }
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri());
    session.send("hello");

    assert_eq!(session.settle().await, Some(SendOutcome::Completed { replies: 0 }));
    assert_eq!(session.conversation().len(), 1);
    assert_eq!(poll_count(&server).await, 3);
}

#[tokio::test]
async fn missing_entry_fields_use_defaults() {
    let server = MockServer::start().await;
    accept_submissions(&server, "hello").await;
    waiting_then(
        &server,
        0,
        json!({
            "status": "done",
            "analysis_result": { "analysis": [
                { "content": "anonymous insight" },
                null,
                { "name": "Quiet" }
            ]}
        }),
    )
    .await;

    let mut session = session_for(&server.uri());
    session.send("hello");
    session.settle().await;

    let messages = session.conversation().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].author(), Some("Agent"));
    assert_eq!(messages[1].text(), "anonymous insight");
    assert_eq!(messages[2].author(), Some("Quiet"));
    assert_eq!(messages[2].text(), "No content available");
}

#[tokio::test]
async fn non_string_fields_do_not_drop_the_result() {
    let server = MockServer::start().await;
    accept_submissions(&server, "hello").await;
    waiting_then(
        &server,
        1,
        json!({
            "status": "done",
            "analysis_result": { "analysis": [
                { "name": "Search", "content": "fine" },
                { "name": "SECAnalyst", "content": 42 }
            ]}
        }),
    )
    .await;

    let mut session = session_for(&server.uri());
    session.send("hello");
    assert_eq!(session.settle().await, Some(SendOutcome::Completed { replies: 2 }));

    let messages = session.conversation().messages();
    assert_eq!((messages[1].author(), messages[1].text()), (Some("Search"), "fine"));
    assert_eq!((messages[2].author(), messages[2].text()), (Some("SECAnalyst"), "42"));
}
