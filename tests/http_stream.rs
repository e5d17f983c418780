//! Wire-level tests for the HTTP transport against a mock backend
//!
//! Spins an axum server on an ephemeral port and drives the real reqwest
//! client through it, including frames split across chunk boundaries.

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use arthmitra_chat::client::{ChatRequest, ChatTransport, HttpChatClient};
use arthmitra_chat::error::ChatError;
use arthmitra_chat::session::ChatSession;
use arthmitra_chat::stream::StreamEvent;

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn sse_response(chunks: Vec<Bytes>) -> impl IntoResponse {
    let frames: Vec<Result<Bytes, std::io::Error>> = chunks.into_iter().map(Ok).collect();
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(futures::stream::iter(frames)),
    )
}

async fn collect_events(mut rx: tokio::sync::mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn decodes_frames_split_across_chunks() {
    let app = Router::new().route(
        "/api/chat/stream",
        post(|| async {
            sse_response(vec![
                Bytes::from_static(b"event: token\ndata: \"Hel\"\n\nevent: tok"),
                Bytes::from_static(b"en\ndata: \"lo\"\n\n"),
                Bytes::from_static(b"event: sources\ndata: [\"RBI Guidelines\"]\n\nevent: done\n\n"),
            ])
        }),
    );

    let client = HttpChatClient::new(spawn_backend(app).await);
    let rx = client.stream_chat(&ChatRequest::new("hello")).await.unwrap();

    let events = collect_events(rx).await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Token("Hel".into()),
            StreamEvent::Token("lo".into()),
            StreamEvent::Sources(vec!["RBI Guidelines".into()]),
            StreamEvent::Done,
        ]
    );
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let app = Router::new().route(
        "/api/chat/stream",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "warming up") }),
    );

    let client = HttpChatClient::new(spawn_backend(app).await);
    let result = client.stream_chat(&ChatRequest::new("hello")).await;

    match result {
        Err(ChatError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "warming up");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn fallback_endpoint_parses_plain_response() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { Json(json!({"response": "Hi", "sources": ["X"]})) }),
    );

    let client = HttpChatClient::new(spawn_backend(app).await);
    let response = client.complete(&ChatRequest::new("hello")).await.unwrap();

    assert_eq!(response.response, "Hi");
    assert_eq!(response.sources, vec!["X".to_string()]);
}

#[tokio::test]
async fn fallback_endpoint_parses_typed_parts() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async {
            Json(json!({
                "response": [{"type": "text", "text": "Namaste"}],
                "sources": []
            }))
        }),
    );

    let client = HttpChatClient::new(spawn_backend(app).await);
    let response = client.complete(&ChatRequest::new("hello")).await.unwrap();

    assert_eq!(response.response, "Namaste");
}

#[tokio::test]
async fn session_recovers_over_http_when_stream_errors() {
    let app = Router::new()
        .route(
            "/api/chat/stream",
            post(|| async {
                sse_response(vec![Bytes::from_static(
                    b"event: token\ndata: \"par\"\n\nevent: error\ndata: \"model crashed\"\n\n",
                )])
            }),
        )
        .route(
            "/api/chat",
            post(|| async { Json(json!({"response": "Recovered", "sources": []})) }),
        );

    let client = HttpChatClient::new(spawn_backend(app).await);
    let mut session = ChatSession::new();
    let outcome = session.send(&client, "hello", |_| {}).await.unwrap();

    assert!(outcome.used_fallback);
    assert_eq!(
        session.message(&outcome.message_id).unwrap().content,
        "Recovered"
    );
}
