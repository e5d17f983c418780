//! Error types for the chat client core
//!
//! Chart extraction never errors (failed candidates are silently dropped);
//! everything here belongs to the transport and session boundary.

use thiserror::Error;

pub use reqwest::StatusCode;

/// Errors from the chat transport and session layers.
///
/// Transport failures during a send are recovered internally (the session
/// falls back to the non-streaming endpoint, then to a fixed apology), so
/// the only variant `ChatSession::send` ever returns is `SendInFlight`.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Request could not be built or sent
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("chat endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A send was issued while a previous stream is still being consumed
    #[error("a send is already in flight for this session")]
    SendInFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = ChatError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream down".into(),
        };
        let text = err.to_string();
        assert!(text.contains("502"));
        assert!(text.contains("upstream down"));
    }

    #[test]
    fn test_send_in_flight_display() {
        assert!(ChatError::SendInFlight.to_string().contains("in flight"));
    }
}
