//! Command-line options and failure reporting shared by the binaries.

use clap::{Args, Parser};

use crate::error::A2AError;

/// Default agent endpoint: a local agent on the conventional port.
pub const DEFAULT_AGENT_URL: &str = "http://localhost:10000";

/// Connection and logging options.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// URL of the A2A agent to connect to
    #[arg(long, env = "A2A_AGENT_URL", default_value = DEFAULT_AGENT_URL)]
    pub agent_url: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

/// Interactive terminal client for A2A agents
///
/// Type a query to start a conversation; the agent's replies and streamed
/// task updates are printed as highlighted JSON. Type 'exit' or 'quit' to
/// leave.
#[derive(Parser, Debug)]
#[command(name = "a2a-chat")]
#[command(version, about, long_about = None)]
pub struct ChatCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// One-shot connectivity check against an A2A agent
///
/// Sends one message and prints the first response item.
#[derive(Parser, Debug)]
#[command(name = "a2a-smoke")]
#[command(version, about, long_about = None)]
pub struct SmokeCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Text of the message to send
    #[arg(long, default_value = "What time is it?")]
    pub text: String,
}

/// Text a binary prints to stderr when it fails: the error chain, plus the
/// protocol label when the agent answered with a known JSON-RPC error.
pub fn failure_report(error: &anyhow::Error) -> String {
    let mut report = format!("Error: {error:?}");
    if let Some(label) = error.downcast_ref::<A2AError>().and_then(A2AError::rpc_label) {
        report.push_str("\nAgent reported: ");
        report.push_str(label);
    }
    report
}
