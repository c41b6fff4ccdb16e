//! End-to-end exchanges against a mocked agent endpoint.

use std::time::Duration;

use agentdesk::api::{HttpBackend, QueryBackend, accumulate};
use agentdesk::config::StreamFilter;
use agentdesk::error::{FAILED_FETCH_MESSAGE, FailureKind};
use agentdesk::exchange::{StreamOptions, run_one_shot, run_stream};
use agentdesk::types::{ResponseMode, Role};
use agentdesk::{QueryError, RequestState, SessionState};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(server: &MockServer) -> String {
    format!("{}/call-api", server.uri())
}

fn fast_options() -> StreamOptions {
    StreamOptions {
        filter: StreamFilter::default(),
        chunk_delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn one_shot_posts_content_and_shows_string_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-api"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "content": "What is 2+2?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("**4**")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server));
    let mut session = SessionState::default();
    let answer = run_one_shot(&mut session, &backend, "What is 2+2?")
        .await
        .expect("query should succeed");

    assert_eq!(answer, "**4**");
    assert_eq!(session.response, "**4**");
    assert_eq!(session.state(), RequestState::Complete);
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].query, "What is 2+2?");
    assert_eq!(session.error, None);
}

#[tokio::test]
async fn one_shot_pretty_prints_object_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": 4 })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server));
    let answer = backend.complete("sum").await.expect("query should succeed");
    assert_eq!(answer, "{\n  \"answer\": 4\n}");
}

#[tokio::test]
async fn server_error_is_rejected_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server));
    let mut session = SessionState::default();
    let err = run_one_shot(&mut session, &backend, "hello")
        .await
        .expect_err("500 must fail");

    assert_eq!(
        err,
        QueryError::Rejected {
            status: 500,
            body: "boom".to_string()
        }
    );
    assert_eq!(session.state(), RequestState::Failed(FailureKind::Rejected));
    assert_eq!(session.error.as_deref(), Some(FAILED_FETCH_MESSAGE));
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_reports_failed_fetch() {
    // nothing listens on port 1
    let backend = HttpBackend::new("http://127.0.0.1:1/call-api");
    let mut session = SessionState::default();
    let err = run_one_shot(&mut session, &backend, "hello")
        .await
        .expect_err("connection must fail");

    assert!(matches!(err, QueryError::NoResponse(_)));
    assert_eq!(session.error.as_deref(), Some(FAILED_FETCH_MESSAGE));
    assert!(!session.loading());
}

#[tokio::test]
async fn streamed_body_is_cleaned_and_published() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-api"))
        .and(body_json(json!({ "content": "hi" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("data: Processing your request... Hello"),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server));
    let mut session = SessionState::default();
    let text = run_stream(
        &mut session,
        &backend,
        "hi",
        &fast_options(),
        CancellationToken::new(),
    )
    .await
    .expect("stream should finish");

    assert_eq!(text, "Hello");
    assert_eq!(session.state(), RequestState::Complete);
    let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(session.messages()[1].content, text);
}

#[tokio::test]
async fn raw_stream_chunks_accumulate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: Hello"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server));
    let chunks = backend
        .open_stream("hi")
        .await
        .expect("request should succeed")
        .expect("body should be present");
    let pieces: Vec<String> = chunks
        .map(|chunk| String::from_utf8(chunk.expect("chunk")).expect("utf-8"))
        .collect()
        .await;

    let text = accumulate(&StreamFilter::default(), pieces.iter().map(String::as_str));
    assert_eq!(text, "Hello");
}

#[tokio::test]
async fn empty_stream_body_is_no_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server));
    let mut session = SessionState::default();
    let err = run_stream(
        &mut session,
        &backend,
        "hi",
        &fast_options(),
        CancellationToken::new(),
    )
    .await
    .expect_err("empty body must fail");

    assert!(matches!(err, QueryError::NoResponse(_)));
    assert_eq!(session.state(), RequestState::Failed(FailureKind::NoResponse));
    assert_eq!(
        session.error,
        Some(err.user_message(ResponseMode::Stream))
    );
    // only the user's message remains
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test]
async fn stream_mode_rejection_names_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server));
    let mut session = SessionState::default();
    let _ = run_stream(
        &mut session,
        &backend,
        "hi",
        &fast_options(),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(
        session.error.as_deref(),
        Some("The server rejected the request (status 503).")
    );
}
