//! A2A client: the collaborator the conversation driver talks through.
//!
//! - [`A2AClient`]: connects to an agent (card discovery + capability
//!   detection) and implements [`MessageSender`]
//! - [`CardResolver`]: discovers agent cards via the well-known URL convention
//! - [`Transport`] / [`JsonRpcTransport`]: pluggable transport layer
//! - [`SseStream`]: decoded SSE event stream for `message/stream`
//! - [`ClientTaskManager`]: folds streamed events into task snapshots
//!
//! # Quick Start
//!
//! ```no_run
//! use a2a_chat::client::{A2AClient, MessageSender};
//! use a2a_chat::types::Message;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = A2AClient::connect("http://localhost:10000").await?;
//! let mut events = client.send_message(Message::user_text("Hello, agent!", None)).await?;
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event?);
//! }
//! # Ok(())
//! # }
//! ```

mod a2a_client;
mod card_resolver;
mod sse;
mod task_manager;
mod transport;

pub use a2a_client::{A2AClient, ConnectOptions, EventStream, MessageSender};
pub use card_resolver::CardResolver;
pub use sse::SseStream;
pub use task_manager::{append_artifact_to_task, ClientTaskManager};
pub use transport::{JsonRpcTransport, Transport, TransportConfig};
