//! Chat backend transport
//!
//! Two endpoints on the external backend:
//! - `POST /api/chat/stream` answers with newline-framed token events
//! - `POST /api/chat` is the synchronous fallback used when streaming fails
//!
//! `ChatTransport` is the seam the session drives; `HttpChatClient` is the
//! reqwest implementation.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::session::{HistoryMessage, UserProfile};
use crate::stream::{FrameDecoder, StreamEvent};

/// Body for both chat endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    pub history: Vec<HistoryMessage>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            profile: None,
            history: Vec::new(),
            user_id: None,
            session_id: None,
        }
    }
}

/// Fallback endpoint response
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Vec<String>,
}

/// Wire shape of the fallback response. The `response` field usually arrives
/// as a string, but some model backends hand through an array of typed parts.
#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    response: ResponseText,
    #[serde(default)]
    sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseText {
    Text(String),
    Parts(Vec<ResponsePart>),
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ChatResponseBody {
    fn into_response(self) -> ChatResponse {
        let response = match self.response {
            ResponseText::Text(text) => text,
            ResponseText::Parts(parts) => parts
                .into_iter()
                .find(|p| p.kind == "text")
                .and_then(|p| p.text)
                .unwrap_or_else(|| "No response".to_string()),
        };
        ChatResponse {
            response,
            sources: self.sources,
        }
    }
}

/// Transport seam between the session and the backend
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open the streaming endpoint.
    ///
    /// `Err` only covers failures before any frame arrives (connect errors,
    /// non-success status). Once the channel exists, read failures surface
    /// as `StreamEvent::Error` and a clean end of stream closes the channel.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ChatError>;

    /// Single-shot fallback call
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError>;
}

/// HTTP implementation of the chat transport
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
    fallback_timeout: Option<Duration>,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            fallback_timeout: None,
        }
    }

    /// Bound the fallback call. The streaming call is deliberately left
    /// unbounded; a whole-request timeout would kill long responses.
    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ChatError> {
        let response = self
            .http
            .post(format!("{}/api/chat/stream", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        debug!(status = %status, "chat stream opened");

        let (tx, rx) = mpsc::channel(100);
        let bytes_stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut decoder = FrameDecoder::new();
            futures::pin_mut!(bytes_stream);

            while let Some(chunk) = bytes_stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(error = %e, "chat stream read failed");
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };

                for event in decoder.feed(&bytes) {
                    let done = matches!(event, StreamEvent::Done);
                    if tx.send(event).await.is_err() {
                        return;
                    }
                    if done {
                        return;
                    }
                }
            }

            decoder.finish();
        });

        Ok(rx)
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let mut builder = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(request);

        if let Some(timeout) = self.fallback_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        let body: ChatResponseBody = response.json().await?;
        Ok(body.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let mut request = ChatRequest::new("How do I save tax?");
        request.user_id = Some("u1".into());

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"userId\":\"u1\""));
        assert!(json.contains("\"history\":[]"));
        assert!(!json.contains("sessionId"));
        assert!(!json.contains("profile"));
    }

    #[test]
    fn test_response_plain_string() {
        let body: ChatResponseBody =
            serde_json::from_str(r#"{"response":"Hi","sources":["RBI"]}"#).unwrap();
        let response = body.into_response();
        assert_eq!(response.response, "Hi");
        assert_eq!(response.sources, vec!["RBI".to_string()]);
    }

    #[test]
    fn test_response_typed_parts() {
        let body: ChatResponseBody = serde_json::from_str(
            r#"{"response":[{"type":"thinking"},{"type":"text","text":"Namaste"}],"sources":[]}"#,
        )
        .unwrap();
        assert_eq!(body.into_response().response, "Namaste");
    }

    #[test]
    fn test_response_parts_without_text() {
        let body: ChatResponseBody =
            serde_json::from_str(r#"{"response":[{"type":"thinking"}]}"#).unwrap();
        let response = body.into_response();
        assert_eq!(response.response, "No response");
        assert!(response.sources.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpChatClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
