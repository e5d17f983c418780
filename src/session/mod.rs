//! Chat session state
//!
//! One `ChatSession` per open chat view. It owns the message list, the
//! pinned-chart store and the in-flight stream target, and drives the full
//! send cycle: stream tokens into a placeholder message, fall back to the
//! synchronous endpoint on any transport failure, then run chart inference
//! against the settled response.
//!
//! Everything runs on one logical task; the only concurrency hazard is a
//! second send while a stream is active, which is rejected.

mod types;

use tracing::{debug, info, warn};

use crate::chart::{build_source_chart_data, infer_chart, ChartDatum, ChartSnapshot, SnapshotStore};
use crate::client::{ChatRequest, ChatTransport};
use crate::error::ChatError;
use crate::store::{SessionStore, StoreError};
use crate::stream::StreamEvent;

pub use types::{ChatMessage, HistoryMessage, Role, SessionSnapshot, UserProfile};

/// Shown as the assistant reply when both the stream and the fallback fail.
/// The only user-visible error text this layer produces.
pub const FALLBACK_APOLOGY: &str =
    "Sorry, I'm having trouble answering right now. Please try again in a moment.";

/// Transient upload-status notices are rendered in the chat but are not
/// conversational turns, so they never enter the request history.
const UPLOAD_STATUS_PREFIXES: [&str; 3] = ["uploading", "✅ ", "❌ Failed to upload"];

/// Store key for the cached session snapshot
const SESSION_KEY: &str = "session";

/// Which chart the view renders; switching never touches the pinned store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartMode {
    /// The active pinned snapshot from the latest responses
    #[default]
    Response,
    /// Citation-frequency aggregation across the whole conversation
    Sources,
}

/// Result of one completed send cycle
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// Id of the assistant message that received the response
    pub message_id: String,
    /// The stream was abandoned and the synchronous endpoint answered
    pub used_fallback: bool,
    /// Both paths failed; the message content is the apology text
    pub failed: bool,
    /// A new chart snapshot was pinned from this response
    pub pinned: bool,
}

/// UI-state container for one chat view
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    profile: Option<UserProfile>,
    user_id: Option<String>,
    session_id: Option<String>,
    charts: SnapshotStore,
    chart_mode: ChartMode,
    /// Id of the assistant message currently receiving tokens
    stream_target: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: Option<UserProfile>) {
        self.profile = profile;
    }

    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    pub fn set_session_id(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
    }

    pub fn charts(&self) -> &SnapshotStore {
        &self.charts
    }

    pub fn charts_mut(&mut self) -> &mut SnapshotStore {
        &mut self.charts
    }

    pub fn chart_mode(&self) -> ChartMode {
        self.chart_mode
    }

    pub fn set_chart_mode(&mut self, mode: ChartMode) {
        self.chart_mode = mode;
    }

    /// The sources aggregation view, computed on demand
    pub fn source_chart_data(&self) -> Vec<ChartDatum> {
        build_source_chart_data(&self.messages)
    }

    /// Append a message outside the send cycle (upload notices, greetings)
    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Reset the conversation. Pinned charts are detached copies and stay.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.stream_target = None;
    }

    /// Send a user message and drive the response to completion.
    ///
    /// Tokens are appended to an assistant placeholder as they arrive and
    /// mirrored to `on_token`. Any transport failure falls back to the
    /// synchronous endpoint, whose text replaces the partial content; if that
    /// fails too the apology text is substituted. Transport failures never
    /// escape this method: the only error is `SendInFlight` when a previous
    /// send has not finished.
    pub async fn send<T, F>(
        &mut self,
        transport: &T,
        text: &str,
        mut on_token: F,
    ) -> Result<SendOutcome, ChatError>
    where
        T: ChatTransport + ?Sized,
        F: FnMut(&str),
    {
        if self.stream_target.is_some() {
            return Err(ChatError::SendInFlight);
        }

        let request = ChatRequest {
            message: text.to_string(),
            profile: self.profile.clone(),
            history: self.build_history(),
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
        };

        self.messages.push(ChatMessage::user(text));
        let placeholder = ChatMessage::assistant("");
        let target_id = placeholder.id.clone();
        self.messages.push(placeholder);
        self.stream_target = Some(target_id.clone());

        info!(message_len = text.len(), "sending chat message");

        let mut settled = false;
        match transport.stream_chat(&request).await {
            Ok(mut rx) => loop {
                match rx.recv().await {
                    Some(StreamEvent::Token(token)) => {
                        on_token(&token);
                        if let Some(message) = self.message_mut(&target_id) {
                            message.content.push_str(&token);
                        }
                    }
                    Some(StreamEvent::Sources(sources)) => {
                        if let Some(message) = self.message_mut(&target_id) {
                            message.sources = sources;
                        }
                    }
                    Some(StreamEvent::Error(e)) => {
                        warn!(error = %e, "stream reported an error, falling back");
                        break;
                    }
                    Some(StreamEvent::Done) => {
                        settled = true;
                        break;
                    }
                    // Clean end of stream counts as settled
                    None => {
                        settled = true;
                        break;
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "streaming request failed, falling back");
            }
        }

        let mut used_fallback = false;
        let mut failed = false;

        if !settled {
            used_fallback = true;
            match transport.complete(&request).await {
                Ok(response) => {
                    debug!(content_len = response.response.len(), "fallback answered");
                    if let Some(message) = self.message_mut(&target_id) {
                        // Restart, not resume: partial tokens are discarded
                        message.content = response.response;
                        message.sources = response.sources;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "fallback failed, substituting apology");
                    failed = true;
                    if let Some(message) = self.message_mut(&target_id) {
                        message.content = FALLBACK_APOLOGY.to_string();
                        message.sources.clear();
                    }
                }
            }
        }

        self.stream_target = None;

        let pinned = self.pin_inferred_chart(&target_id);

        Ok(SendOutcome {
            message_id: target_id,
            used_fallback,
            failed,
            pinned,
        })
    }

    /// Conversation history for the next request. Built before the new user
    /// message is appended; placeholders and upload-status notices are
    /// excluded.
    fn build_history(&self) -> Vec<HistoryMessage> {
        self.messages
            .iter()
            .filter(|m| !m.content.is_empty() && !is_upload_status(&m.content))
            .map(|m| HistoryMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    /// Inference only ever runs here, against a settled message; a non-empty
    /// result pins a new snapshot (one per message id).
    fn pin_inferred_chart(&mut self, message_id: &str) -> bool {
        let Some(message) = self.message(message_id) else {
            return false;
        };

        let inference = infer_chart(&message.content);
        if inference.data.is_empty() {
            return false;
        }

        debug!(
            rows = inference.data.len(),
            kind = inference.kind.as_str(),
            "pinning inferred chart"
        );
        let snapshot = ChartSnapshot::from_message(message_id, &message.content, inference);
        self.charts.upsert(snapshot)
    }

    fn message_mut(&mut self, id: &str) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Persist profile and ids through the injected store
    pub fn persist(&self, store: &dyn SessionStore) -> Result<(), StoreError> {
        let snapshot = SessionSnapshot {
            profile: self.profile.clone(),
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
        };
        store.set(SESSION_KEY, &serde_json::to_string(&snapshot)?)
    }

    /// Restore cached profile and ids. Returns whether anything was loaded;
    /// an undecodable cache is discarded rather than fatal.
    pub fn restore(&mut self, store: &dyn SessionStore) -> Result<bool, StoreError> {
        let Some(raw) = store.get(SESSION_KEY)? else {
            return Ok(false);
        };

        match serde_json::from_str::<SessionSnapshot>(&raw) {
            Ok(snapshot) => {
                self.profile = snapshot.profile;
                self.user_id = snapshot.user_id;
                self.session_id = snapshot.session_id;
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "discarding undecodable cached session state");
                Ok(false)
            }
        }
    }
}

fn is_upload_status(content: &str) -> bool {
    UPLOAD_STATUS_PREFIXES
        .iter()
        .any(|prefix| content.starts_with(prefix))
}
