//! The conversation driver: read a line, send it, drain the reply.
//!
//! A top-level query starts a new conversation with no correlation ids. When
//! a streamed task reports `input-required`, the driver asks the operator
//! for one more line and submits it with the task's ids, draining that
//! nested reply completely before resuming the outer one.
//!
//! Nested submissions live on an explicit stack of open response streams,
//! not on the call stack.

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::{EventStream, MessageSender};
use crate::console::{Console, Notice, FOLLOW_UP_PROMPT, QUERY_PROMPT};
use crate::error::{A2AError, A2AResult};
use crate::types::{ClientEvent, Correlation, Message, Task, TaskState, TaskUpdate};

/// Lines that end the interactive loop, compared case-insensitively.
pub const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];

/// Whether `line` asks to leave the interactive loop.
pub fn is_exit_keyword(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&line.as_str())
}

/// Build the outbound user message for one turn.
///
/// `None` starts a new conversation; `Some` continues the given task.
pub fn build_message(text: &str, correlation: Option<&Correlation>) -> Message {
    Message::user_text(text, correlation)
}

/// Where the current logical conversation stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// No message sent yet; no correlation ids.
    New,
    /// Draining the agent's response items.
    AwaitingAgent,
    /// Blocked on operator input for the given task.
    InputRequired(Correlation),
    /// Every response stream of the conversation has ended.
    Done,
}

/// Counters for one [`Conversation::submit_and_drain`] call, nested
/// submissions included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnSummary {
    /// Messages sent to the agent.
    pub submissions: usize,
    /// Response items received across all submissions.
    pub items: usize,
    /// Submissions whose response ended with no items.
    pub empty_submissions: usize,
    /// Submissions whose response ended with an unexpected disconnect.
    pub disconnects: usize,
}

/// Payload rendered for a [`ClientEvent::StreamingUpdate`].
#[derive(Debug, Serialize)]
struct StreamingView<'a> {
    task: &'a Task,
    update: Option<&'a TaskUpdate>,
}

struct OpenStream {
    events: EventStream,
    items: usize,
}

/// Drives conversations between an operator and an agent.
pub struct Conversation<S, C> {
    sender: S,
    console: C,
    state: ConversationState,
    transitions: Vec<ConversationState>,
}

impl<S: MessageSender, C: Console> Conversation<S, C> {
    pub fn new(sender: S, console: C) -> Self {
        Self {
            sender,
            console,
            state: ConversationState::New,
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// States entered during the latest [`Self::submit_and_drain`], in order.
    pub fn transitions(&self) -> &[ConversationState] {
        &self.transitions
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Read queries until an exit keyword or the end of input.
    ///
    /// Every other line, empty ones included, becomes a new top-level
    /// conversation. Errors other than disconnects end the loop.
    pub async fn interactive_loop(&mut self) -> A2AResult<()> {
        self.console.notice(Notice::Instructions);
        loop {
            let Some(line) = self.console.read_line(QUERY_PROMPT).await? else {
                debug!("input closed, leaving interactive loop");
                self.console.notice(Notice::Goodbye);
                return Ok(());
            };
            let query = line.trim();
            if is_exit_keyword(query) {
                self.console.notice(Notice::Goodbye);
                return Ok(());
            }
            self.submit_and_drain(query, None).await?;
        }
    }

    /// Send `text` and drain every response item, following input-required
    /// prompts until the conversation is done.
    ///
    /// An unexpected disconnect is reported to the operator and ends only the
    /// submission it hit. Any other error is returned.
    pub async fn submit_and_drain(
        &mut self,
        text: &str,
        correlation: Option<Correlation>,
    ) -> A2AResult<TurnSummary> {
        let mut summary = TurnSummary::default();
        let mut open: Vec<OpenStream> = Vec::new();

        self.transitions.clear();
        self.enter(ConversationState::New);
        if let Some(stream) = self.submit(text, correlation.as_ref(), &mut summary).await? {
            open.push(stream);
        }

        while let Some(top) = open.last_mut() {
            let next = top.events.next().await;
            self.enter(ConversationState::AwaitingAgent);

            match next {
                Some(Ok(event)) => {
                    summary.items += 1;
                    if let Some(top) = open.last_mut() {
                        top.items += 1;
                    }
                    if let Some(correlation) = self.handle_event(event) {
                        if let Some(stream) = self.follow_up(correlation, &mut summary).await? {
                            open.push(stream);
                        }
                    }
                }
                Some(Err(e)) if e.is_disconnect() => {
                    open.pop();
                    self.report_disconnect(&e, &mut summary);
                }
                Some(Err(e)) => {
                    self.enter(ConversationState::Done);
                    return Err(e);
                }
                None => {
                    if let Some(finished) = open.pop() {
                        if finished.items == 0 {
                            summary.empty_submissions += 1;
                            self.console.notice(Notice::NoResponse);
                        }
                        debug!(items = finished.items, depth = open.len(), "response drained");
                    }
                }
            }
        }

        self.enter(ConversationState::Done);
        debug!(?summary, "conversation done");
        Ok(summary)
    }

    /// Render one item. Returns the task to continue when it needs input.
    fn handle_event(&mut self, event: ClientEvent) -> Option<Correlation> {
        match event {
            ClientEvent::StreamingUpdate(task, update) => {
                self.console.render(
                    "Streaming Update",
                    &StreamingView {
                        task: &task,
                        update: update.as_ref(),
                    },
                );
                (task.status.state == TaskState::InputRequired).then(|| task.correlation())
            }
            ClientEvent::FinalReply(message) => {
                self.console.render("Agent Reply", &message);
                None
            }
        }
    }

    /// Ask the operator for a reply and submit it on the task's ids.
    async fn follow_up(
        &mut self,
        correlation: Correlation,
        summary: &mut TurnSummary,
    ) -> A2AResult<Option<OpenStream>> {
        info!(
            task_id = %correlation.task_id,
            context_id = %correlation.context_id,
            "agent requested more input"
        );
        self.enter(ConversationState::InputRequired(correlation.clone()));

        let Some(reply) = self.console.read_line(FOLLOW_UP_PROMPT).await? else {
            self.console.notice(Notice::InputEnded);
            return Ok(None);
        };
        self.submit(&reply, Some(&correlation), summary).await
    }

    async fn submit(
        &mut self,
        text: &str,
        correlation: Option<&Correlation>,
        summary: &mut TurnSummary,
    ) -> A2AResult<Option<OpenStream>> {
        let message = build_message(text, correlation);
        debug!(message_id = %message.message_id, ?correlation, "submitting message");
        summary.submissions += 1;
        self.enter(ConversationState::AwaitingAgent);

        match self.sender.send_message(message).await {
            Ok(events) => Ok(Some(OpenStream { events, items: 0 })),
            Err(e) if e.is_disconnect() => {
                self.report_disconnect(&e, summary);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn enter(&mut self, state: ConversationState) {
        if self.transitions.last() == Some(&state) {
            return;
        }
        debug!(from = ?self.state, to = ?state, "conversation state");
        self.state = state.clone();
        self.transitions.push(state);
    }

    fn report_disconnect(&mut self, error: &A2AError, summary: &mut TurnSummary) {
        warn!(error = %error, "agent connection ended unexpectedly");
        summary.disconnects += 1;
        self.console.notice(Notice::Disconnected);
    }
}
