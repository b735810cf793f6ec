//! `a2a-chat`: talk to an A2A agent from the terminal.

use std::process::ExitCode;

use a2a_chat::cli::{failure_report, ChatCli};
use a2a_chat::client::A2AClient;
use a2a_chat::console::TerminalConsole;
use a2a_chat::conversation::Conversation;
use a2a_chat::render::{JsonRenderer, Tone};
use a2a_chat::telemetry::init_telemetry;
use anyhow::Context;
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = ChatCli::parse();
    init_telemetry(&cli.common.log_level);

    let agent_url = cli.common.agent_url;
    println!("Connecting to agent at {agent_url}...");

    match run(&agent_url).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_report(&e));
            let mut out = JsonRenderer::new(std::io::stdout());
            out.line(
                Tone::Error,
                "❌ Failed to connect or run. Ensure the agent is live and reachable.",
            )
            .ok();
            ExitCode::FAILURE
        }
    }
}

async fn run(agent_url: &str) -> anyhow::Result<()> {
    let client = A2AClient::connect(agent_url)
        .await
        .with_context(|| format!("failed to connect to agent at {agent_url}"))?;

    JsonRenderer::new(std::io::stdout())
        .line(Tone::Success, &format!("✅ Connected to {agent_url}"))?;

    let mut conversation = Conversation::new(client, TerminalConsole::new());
    conversation
        .interactive_loop()
        .await
        .context("conversation with agent failed")?;
    Ok(())
}
