//! # a2a-chat: interactive terminal client for A2A protocol v0.3 agents
//!
//! Connects to a remote agent speaking the
//! [A2A protocol](https://a2a-protocol.org/latest/specification/) over
//! JSON-RPC 2.0, sends operator-typed text as user messages, and renders the
//! agent's replies (direct messages or streamed task updates) as highlighted
//! JSON.
//!
//! ## Overview
//!
//! - [`client::A2AClient`] discovers the agent card, picks the JSON-RPC
//!   endpoint, and sends messages with `message/stream` or `message/send`
//!   depending on the agent's capabilities. Either way the reply arrives as a
//!   stream of [`types::ClientEvent`]s.
//! - [`conversation::Conversation`] runs the read-send-drain loop. When a
//!   task asks for more input it prompts the operator once and continues the
//!   same task by sending its task and context ids.
//! - [`console::Console`] is the operator I/O seam; [`console::TerminalConsole`]
//!   binds it to stdin/stdout through [`render::JsonRenderer`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use a2a_chat::client::A2AClient;
//! use a2a_chat::console::TerminalConsole;
//! use a2a_chat::conversation::Conversation;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = A2AClient::connect("http://localhost:10000").await?;
//!     let mut conversation = Conversation::new(client, TerminalConsole::new());
//!     conversation.interactive_loop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//!
//! An agent that drops its response stream mid-reply surfaces as
//! [`A2AError::Disconnected`]; the driver reports it and keeps the session
//! alive. Every other [`A2AError`] ends the session.

pub mod cli;
pub mod client;
pub mod console;
pub mod conversation;
pub mod error;
pub mod render;
pub mod telemetry;
pub mod types;

/// Prelude module that re-exports commonly used types and traits.
///
/// ```
/// use a2a_chat::prelude::*;
///
/// let msg = Message::user_text("hello", None);
/// assert_eq!(msg.role, Role::User);
/// ```
pub mod prelude {
    pub use crate::client::{A2AClient, ConnectOptions, EventStream, MessageSender};
    pub use crate::console::{Console, Notice, TerminalConsole};
    pub use crate::conversation::{build_message, Conversation, ConversationState, TurnSummary};
    pub use crate::error::{A2AError, A2AResult};
    pub use crate::types::{
        AgentCard, ClientEvent, Correlation, Message, Part, Role, StreamResponse, Task, TaskState,
        TaskUpdate,
    };
}

pub use error::{A2AError, A2AResult};
