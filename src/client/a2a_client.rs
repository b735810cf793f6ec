//! High-level A2A client: connect to an agent and exchange messages.
//!
//! [`A2AClient::connect`] resolves the agent card, picks the JSON-RPC
//! endpoint, and records whether the agent streams. Sending a message then
//! uses `message/stream` or `message/send` accordingly, and both paths are
//! presented to the caller as one sequence of [`ClientEvent`]s.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{A2AError, A2AResult};
use crate::types::{
    AgentCard, ClientEvent, GetTaskParams, JsonRpcId, JsonRpcRequest, JsonRpcResponse, Message,
    SendMessageParams, SendMessageResponse, Task,
};

use super::card_resolver::CardResolver;
use super::task_manager::ClientTaskManager;
use super::transport::{JsonRpcTransport, Transport, TransportConfig};

/// The asynchronous sequence of response items for one submitted message.
pub type EventStream = Pin<Box<dyn Stream<Item = A2AResult<ClientEvent>> + Send>>;

/// Anything that can submit a message to an agent and stream back its reply.
///
/// This is the seam the conversation driver depends on; [`A2AClient`] is the
/// networked implementation.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Submit `message` and return the agent's response items.
    ///
    /// The stream ends normally when the agent is done. A stream that ends
    /// early yields [`A2AError::Disconnected`] as its last item.
    async fn send_message(&self, message: Message) -> A2AResult<EventStream>;
}

/// Options for [`A2AClient::connect_with`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Agent card path override. `None` uses the well-known paths.
    pub card_path: Option<String>,
    /// HTTP transport configuration.
    pub transport: TransportConfig,
    /// Use `message/stream` when the agent advertises streaming.
    pub prefer_streaming: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            card_path: None,
            transport: TransportConfig::default(),
            prefer_streaming: true,
        }
    }
}

/// Client for a single A2A agent.
///
/// # Example
///
/// ```no_run
/// use a2a_chat::client::{A2AClient, MessageSender};
/// use a2a_chat::types::{ClientEvent, Message};
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = A2AClient::connect("http://localhost:10000").await?;
/// let mut events = client.send_message(Message::user_text("Hello", None)).await?;
/// while let Some(event) = events.next().await {
///     match event? {
///         ClientEvent::StreamingUpdate(task, _) => println!("task {}: {}", task.id, task.status.state),
///         ClientEvent::FinalReply(msg) => println!("agent: {}", msg.text()),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct A2AClient {
    transport: Box<dyn Transport>,
    agent_card: Option<AgentCard>,
    streaming: bool,
}

impl std::fmt::Debug for A2AClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("A2AClient")
            .field("agent_card", &self.agent_card)
            .field("streaming", &self.streaming)
            .finish_non_exhaustive()
    }
}

impl A2AClient {
    /// Connect to the agent at `url` with default options.
    ///
    /// Performs capability discovery: the agent card is fetched from the
    /// well-known path under `url`, the JSON-RPC endpoint is taken from it,
    /// and streaming is used if the card advertises it.
    ///
    /// # Errors
    ///
    /// Returns an error if the card cannot be fetched or parsed, or if it
    /// names no JSON-RPC endpoint.
    pub async fn connect(url: &str) -> A2AResult<Self> {
        Self::connect_with(url, ConnectOptions::default()).await
    }

    /// Connect to the agent at `url` with explicit options.
    pub async fn connect_with(url: &str, options: ConnectOptions) -> A2AResult<Self> {
        let mut resolver = CardResolver::new();
        if let Some(path) = options.card_path.clone() {
            resolver = resolver.with_card_path(path);
        }
        let card = resolver.resolve(url).await?;
        Self::from_card(card, options)
    }

    /// Create a client from an already-resolved agent card.
    ///
    /// # Errors
    ///
    /// Returns an error if the card does not name a JSON-RPC endpoint.
    pub fn from_card(card: AgentCard, options: ConnectOptions) -> A2AResult<Self> {
        let endpoint = CardResolver::jsonrpc_endpoint(&card).ok_or_else(|| {
            A2AError::Transport(format!(
                "agent card for '{}' has no JSONRPC endpoint",
                card.name
            ))
        })?;

        let streaming = options.prefer_streaming && card.supports_streaming();
        info!(
            agent = %card.name,
            endpoint = %endpoint,
            streaming,
            "agent capabilities resolved"
        );

        Ok(Self {
            transport: Box::new(JsonRpcTransport::with_config(endpoint, options.transport)),
            agent_card: Some(card),
            streaming,
        })
    }

    /// Create a client with a custom transport and no agent card.
    pub fn with_transport(transport: Box<dyn Transport>, streaming: bool) -> Self {
        Self {
            transport,
            agent_card: None,
            streaming,
        }
    }

    /// The agent card resolved during [`connect`](Self::connect), if any.
    pub fn agent_card(&self) -> Option<&AgentCard> {
        self.agent_card.as_ref()
    }

    /// Whether messages are sent with `message/stream`.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Get the current state of a task (`tasks/get`).
    pub async fn get_task(&self, task_id: &str, history_length: Option<i32>) -> A2AResult<Task> {
        let params = GetTaskParams {
            id: task_id.to_string(),
            history_length,
        };
        let request = build_request("tasks/get", &params)?;
        let response = self.transport.send(&request).await?;
        parse_result(response)
    }

    /// Close the client and release any held resources.
    pub async fn close(self) -> A2AResult<()> {
        self.transport.close().await
    }

    async fn send_streaming(&self, params: SendMessageParams) -> A2AResult<EventStream> {
        let request = build_request("message/stream", &params)?;
        let mut sse = self.transport.send_stream(&request).await?;

        let events = async_stream::try_stream! {
            let mut manager = ClientTaskManager::new();
            while let Some(event) = sse.next().await {
                let item = manager.process(event?)?;
                yield item;
            }
        };
        Ok(Box::pin(events))
    }

    async fn send_blocking(&self, params: SendMessageParams) -> A2AResult<EventStream> {
        let request = build_request("message/send", &params)?;
        let response = self.transport.send(&request).await?;
        let item = match parse_result::<SendMessageResponse>(response)? {
            SendMessageResponse::Task(task) => ClientEvent::StreamingUpdate(task, None),
            SendMessageResponse::Message(message) => ClientEvent::FinalReply(message),
        };
        Ok(Box::pin(stream::iter([Ok::<_, A2AError>(item)])))
    }
}

#[async_trait]
impl MessageSender for A2AClient {
    async fn send_message(&self, message: Message) -> A2AResult<EventStream> {
        debug!(
            message_id = %message.message_id,
            task_id = ?message.task_id,
            context_id = ?message.context_id,
            streaming = self.streaming,
            "sending message"
        );
        let params = SendMessageParams {
            message,
            configuration: None,
            metadata: None,
        };
        if self.streaming {
            self.send_streaming(params).await
        } else {
            self.send_blocking(params).await
        }
    }
}

// ──────────────────────────────────────────────────
// Internal helpers
// ──────────────────────────────────────────────────

/// Build a JSON-RPC request with a random UUID ID.
fn build_request(method: &str, params: &impl Serialize) -> A2AResult<JsonRpcRequest> {
    let params_value = serde_json::to_value(params)
        .map_err(|e| A2AError::Transport(format!("failed to serialize request params: {e}")))?;

    Ok(JsonRpcRequest::new(
        JsonRpcId::String(uuid::Uuid::new_v4().to_string()),
        method,
        Some(params_value),
    ))
}

/// Parse the `result` field from a JSON-RPC response into the expected type.
///
/// If the response contains an error, converts it into an [`A2AError::JsonRpc`].
fn parse_result<T: serde::de::DeserializeOwned>(response: JsonRpcResponse) -> A2AResult<T> {
    if let Some(error) = response.error {
        return Err(error.into());
    }

    let result = response.result.ok_or_else(|| {
        A2AError::InvalidJson("JSON-RPC response has neither 'result' nor 'error'".to_string())
    })?;

    serde_json::from_value(result)
        .map_err(|e| A2AError::InvalidJson(format!("failed to deserialize response result: {e}")))
}
