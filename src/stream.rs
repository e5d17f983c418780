//! Stream frame decoding for the chat endpoint
//!
//! The backend streams newline-delimited frames terminated by a blank line:
//!
//! ```text
//! event: token
//! data: "Hel"
//!
//! event: sources
//! data: ["Income Tax Act 1961"]
//! ```
//!
//! `FrameDecoder` buffers raw bytes, splits on the double-newline frame
//! delimiter and emits typed events. A trailing partial frame stays in the
//! buffer until the next read completes it.

use serde::Deserialize;
use tracing::warn;

/// A decoded frame from the streaming chat endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental response text; always appended, never replaces
    Token(String),
    /// Citation labels for the in-progress message; replaces the prior list
    Sources(Vec<String>),
    /// Server-reported failure; the caller abandons the stream
    Error(String),
    /// Normal end of stream
    Done,
}

/// Buffering decoder for the frame protocol
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes and drain all complete frames.
    ///
    /// Incomplete trailing data is retained for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = parse_frame(&frame) {
                events.push(event);
            }
        }
        events
    }

    /// Signal end of input. There is no next read to complete a partial
    /// frame, so any leftover is logged and dropped.
    pub fn finish(&mut self) {
        if !self.buffer.trim().is_empty() {
            warn!(
                leftover_len = self.buffer.len(),
                "stream ended with an incomplete frame in the buffer"
            );
        }
        self.buffer.clear();
    }
}

/// Parse one complete frame into an event.
///
/// Returns `None` for frames that carry no usable payload (comments, unknown
/// kinds, undecodable data); the stream keeps going either way.
fn parse_frame(frame: &str) -> Option<StreamEvent> {
    let mut kind = "message";
    let mut data = String::new();

    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            kind = rest.trim();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push_str(rest.trim());
        }
    }

    // `done` needs no payload
    if kind == "done" {
        return Some(StreamEvent::Done);
    }
    if data.is_empty() {
        return None;
    }

    match kind {
        "token" => decode_payload::<String>(&data, kind).map(StreamEvent::Token),
        "sources" => decode_payload::<Vec<String>>(&data, kind).map(StreamEvent::Sources),
        "error" => decode_payload::<String>(&data, kind).map(StreamEvent::Error),
        other => {
            warn!(kind = other, "skipping unknown stream frame kind");
            None
        }
    }
}

fn decode_payload<T: for<'de> Deserialize<'de>>(data: &str, kind: &str) -> Option<T> {
    match serde_json::from_str(data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(kind, error = %e, "failed to decode stream frame payload");
            None
        }
    }
}
