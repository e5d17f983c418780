//! Arth-Mitra chat client core
//!
//! Client-side core for the Arth-Mitra financial assistant:
//! - Incremental token streaming from the chat backend, with a transparent
//!   non-streaming fallback
//! - Chat session state (messages, citation sources, financial profile)
//! - Auto-chart inference over settled assistant responses
//! - Bounded store of user-pinned chart snapshots

pub mod chart;
pub mod client;
pub mod config;
pub mod error;
pub mod repl;
pub mod session;
pub mod store;
pub mod stream;

pub use chart::{ChartDatum, ChartInference, ChartKind, ChartSnapshot, ChartUnit, SnapshotStore};
pub use client::{ChatRequest, ChatResponse, ChatTransport, HttpChatClient};
pub use error::ChatError;
pub use session::{ChatMessage, ChatSession, Role, SendOutcome, UserProfile};
pub use stream::{FrameDecoder, StreamEvent};
