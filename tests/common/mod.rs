//! Shared test utilities for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use a2a_chat::client::{EventStream, MessageSender};
use a2a_chat::console::{Console, Notice};
use a2a_chat::error::{A2AError, A2AResult};
use a2a_chat::types::{
    ClientEvent, Message, Part, Role, Task, TaskState, TaskStatus, TaskStatusUpdateEvent,
    TaskUpdate,
};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

// ============================================================================
// Fake agent server
// ============================================================================

/// What the fake agent answers to the next JSON-RPC call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A JSON-RPC `result` body (for `message/send` and `tasks/get`).
    Result(Value),
    /// A JSON-RPC `error` body.
    Error { code: i64, message: String },
    /// An SSE body with one JSON-RPC-wrapped `data:` frame per event.
    Events(Vec<Value>),
}

/// Where the fake agent serves its card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardLocation {
    /// `/.well-known/agent-card.json`
    Current,
    /// Only the pre-v0.3 `/.well-known/agent.json`.
    Legacy,
}

struct FakeAgentState {
    card: Value,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Value>>,
}

/// An in-process A2A agent that answers from a script.
pub struct FakeAgent {
    pub base_url: String,
    state: Arc<FakeAgentState>,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeAgent {
    /// Start an agent that advertises `streaming` and serves its card at the
    /// current well-known path.
    pub async fn start(streaming: bool, replies: Vec<Reply>) -> Self {
        Self::start_with(streaming, CardLocation::Current, replies).await
    }

    pub async fn start_with(streaming: bool, location: CardLocation, replies: Vec<Reply>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let state = Arc::new(FakeAgentState {
            card: test_agent_card(&format!("{}/a2a", base_url), streaming),
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        });

        let card_path = match location {
            CardLocation::Current => "/.well-known/agent-card.json",
            CardLocation::Legacy => "/.well-known/agent.json",
        };
        let app = Router::new()
            .route(card_path, get(serve_card))
            .route("/a2a", post(serve_rpc))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            _handle: handle,
        }
    }

    /// Every JSON-RPC request body received so far.
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The `params.message` of every request received so far.
    pub fn sent_messages(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .map(|r| r["params"]["message"].clone())
            .collect()
    }
}

async fn serve_card(State(state): State<Arc<FakeAgentState>>) -> Json<Value> {
    Json(state.card.clone())
}

async fn serve_rpc(State(state): State<Arc<FakeAgentState>>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body.clone());
    let id = body["id"].clone();
    let reply = state.replies.lock().unwrap().pop_front();

    match reply {
        Some(Reply::Result(result)) => {
            Json(json!({"jsonrpc": "2.0", "id": id, "result": result})).into_response()
        }
        Some(Reply::Error { code, message }) => Json(json!({
            "jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}
        }))
        .into_response(),
        Some(Reply::Events(events)) => {
            let body: String = events
                .iter()
                .map(|event| {
                    let frame = json!({"jsonrpc": "2.0", "id": id, "result": event});
                    format!("data: {}\n\n", frame)
                })
                .collect();
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "no scripted reply").into_response(),
    }
}

/// Agent card JSON with one JSONRPC interface at `url`.
pub fn test_agent_card(url: &str, streaming: bool) -> Value {
    json!({
        "name": "Test Agent",
        "description": "A scripted agent for testing",
        "version": "0.1.0",
        "url": url,
        "protocolVersion": "0.3.0",
        "preferredTransport": "JSONRPC",
        "capabilities": {"streaming": streaming},
        "defaultInputModes": ["text"],
        "defaultOutputModes": ["text"],
        "skills": [{"id": "time", "name": "Time", "description": "Tells the time", "tags": ["time"]}]
    })
}

// ============================================================================
// Wire-format event builders
// ============================================================================

pub fn task_json(task_id: &str, context_id: &str, state: &str) -> Value {
    json!({"kind": "task", "id": task_id, "contextId": context_id, "status": {"state": state}})
}

pub fn status_json(task_id: &str, context_id: &str, state: &str, is_final: bool) -> Value {
    json!({
        "kind": "status-update", "taskId": task_id, "contextId": context_id,
        "status": {"state": state}, "final": is_final
    })
}

pub fn agent_message_json(text: &str) -> Value {
    json!({
        "kind": "message", "messageId": format!("agent-{text}"), "role": "agent",
        "parts": [{"kind": "text", "text": text}]
    })
}

// ============================================================================
// Typed response items
// ============================================================================

pub fn agent_reply(text: &str) -> ClientEvent {
    ClientEvent::FinalReply(Message {
        message_id: format!("agent-{text}"),
        role: Role::Agent,
        kind: "message".to_string(),
        parts: vec![Part::text(text)],
        context_id: None,
        task_id: None,
        metadata: None,
    })
}

/// A `StreamingUpdate` for task `task_id` in `state`, with its status update.
pub fn task_update(task_id: &str, context_id: &str, state: TaskState) -> ClientEvent {
    let task = Task {
        id: task_id.to_string(),
        context_id: context_id.to_string(),
        kind: "task".to_string(),
        status: TaskStatus::new(state),
        artifacts: None,
        history: None,
        metadata: None,
    };
    let update = TaskStatusUpdateEvent {
        task_id: task_id.to_string(),
        context_id: context_id.to_string(),
        kind: "status-update".to_string(),
        status: TaskStatus::new(state),
        r#final: state.is_terminal(),
        metadata: None,
    };
    ClientEvent::StreamingUpdate(task, Some(TaskUpdate::Status(update)))
}

// ============================================================================
// Scripted collaborators for the conversation driver
// ============================================================================

/// A [`MessageSender`] that answers each submission from a queue of scripted
/// item sequences and records what it was sent.
#[derive(Default)]
pub struct ScriptedSender {
    responses: Mutex<VecDeque<Vec<A2AResult<ClientEvent>>>>,
    sent: Mutex<Vec<Message>>,
}

impl ScriptedSender {
    pub fn new(responses: Vec<Vec<A2AResult<ClientEvent>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages submitted so far, in order.
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for ScriptedSender {
    async fn send_message(&self, message: Message) -> A2AResult<EventStream> {
        self.sent.lock().unwrap().push(message);
        let items = self.responses.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// A [`MessageSender`] whose every submission fails with `error`.
pub struct FailingSender(pub A2AError);

#[async_trait]
impl MessageSender for FailingSender {
    async fn send_message(&self, _message: Message) -> A2AResult<EventStream> {
        Err(self.0.clone())
    }
}

/// What a [`ScriptedConsole`] was asked to show.
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Prompt(String),
    Render { title: String, payload: Value },
    Notice(Notice),
}

/// A [`Console`] fed from a list of input lines, recording everything shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    input: VecDeque<String>,
    pub shown: Vec<Shown>,
}

impl ScriptedConsole {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            input: lines.iter().map(|l| l.to_string()).collect(),
            shown: Vec::new(),
        }
    }

    pub fn prompts(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Prompt(p) => Some(p.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Render { title, .. } => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self, prompt: &str) -> A2AResult<Option<String>> {
        self.shown.push(Shown::Prompt(prompt.to_string()));
        Ok(self.input.pop_front())
    }

    fn render<T: Serialize + Debug + ?Sized>(&mut self, title: &str, payload: &T) {
        let payload = serde_json::to_value(payload).unwrap_or(Value::Null);
        self.shown.push(Shown::Render {
            title: title.to_string(),
            payload,
        });
    }

    fn notice(&mut self, notice: Notice) {
        self.shown.push(Shown::Notice(notice));
    }
}
