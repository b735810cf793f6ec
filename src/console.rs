//! Operator-facing terminal I/O.
//!
//! The conversation driver talks to the operator only through [`Console`],
//! so the same driver runs against a real terminal or a scripted test double.

use std::fmt::{self, Debug};
use std::io::Stdout;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use crate::error::A2AResult;
use crate::render::{JsonRenderer, Tone};

/// Prompt shown before each top-level query.
pub const QUERY_PROMPT: &str = "\n🟢 Your query: ";

/// Prompt shown when the agent asks for more input.
pub const FOLLOW_UP_PROMPT: &str = "🟡 Agent needs more input. Your reply: ";

/// Fixed status messages shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// How to use the interactive loop.
    Instructions,
    /// The operator asked to leave.
    Goodbye,
    /// A submission yielded no response items.
    NoResponse,
    /// The agent's response stream ended early.
    Disconnected,
    /// Input closed while the agent was waiting for a reply.
    InputEnded,
}

impl Notice {
    pub fn tone(&self) -> Tone {
        match self {
            Notice::Instructions => Tone::Plain,
            Notice::Goodbye => Tone::Plain,
            Notice::NoResponse | Notice::Disconnected | Notice::InputEnded => Tone::Warning,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Notice::Instructions => "\nEnter your query below. Type 'exit' to quit.",
            Notice::Goodbye => "👋 Exiting...",
            Notice::NoResponse => "⚠️  No response received from agent",
            Notice::Disconnected => {
                "⚠️  Agent connection ended unexpectedly. Please check if the agent is running correctly."
            }
            Notice::InputEnded => "⚠️  Input closed before a reply was given; ending this conversation.",
        };
        f.write_str(text)
    }
}

/// Line input and rendered output for the conversation driver.
#[async_trait]
pub trait Console: Send {
    /// Show `prompt` and read one line. `Ok(None)` means input is closed.
    async fn read_line(&mut self, prompt: &str) -> A2AResult<Option<String>>;

    /// Render a titled payload. Must not fail the conversation.
    fn render<T: Serialize + Debug + ?Sized>(&mut self, title: &str, payload: &T);

    /// Show a fixed status message.
    fn notice(&mut self, notice: Notice);
}

/// [`Console`] over the process's stdin and stdout.
pub struct TerminalConsole {
    input: Lines<BufReader<Stdin>>,
    output: JsonRenderer<Stdout>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()).lines(),
            output: JsonRenderer::new(std::io::stdout()),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for TerminalConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalConsole")
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Console for TerminalConsole {
    async fn read_line(&mut self, prompt: &str) -> A2AResult<Option<String>> {
        self.output.prompt(prompt)?;
        Ok(self.input.next_line().await?)
    }

    fn render<T: Serialize + Debug + ?Sized>(&mut self, title: &str, payload: &T) {
        if let Err(e) = self.output.render(title, payload) {
            warn!(error = %e, title, "failed to write rendered payload");
        }
    }

    fn notice(&mut self, notice: Notice) {
        if let Err(e) = self.output.line(notice.tone(), &notice.to_string()) {
            warn!(error = %e, "failed to write notice");
        }
    }
}
