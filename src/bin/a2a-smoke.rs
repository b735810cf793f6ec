//! `a2a-smoke`: send one message and print the first response item.

use std::process::ExitCode;

use a2a_chat::cli::{failure_report, SmokeCli};
use a2a_chat::client::{A2AClient, MessageSender};
use a2a_chat::conversation::build_message;
use a2a_chat::telemetry::init_telemetry;
use a2a_chat::types::ClientEvent;
use anyhow::Context;
use clap::Parser;
use futures::StreamExt;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = SmokeCli::parse();
    init_telemetry(&cli.common.log_level);

    match run(&cli.common.agent_url, &cli.text).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_report(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(agent_url: &str, text: &str) -> anyhow::Result<()> {
    println!("Connecting to agent at {agent_url}...");
    let client = A2AClient::connect(agent_url)
        .await
        .with_context(|| format!("failed to connect to agent at {agent_url}"))?;

    println!("Creating message...");
    let message = build_message(text, None);

    println!("Sending message...");
    let mut events = client
        .send_message(message)
        .await
        .context("failed to send message")?;

    match events.next().await {
        Some(item) => {
            let item = item.context("failed to read first response item")?;
            let kind = match &item {
                ClientEvent::StreamingUpdate(..) => "StreamingUpdate",
                ClientEvent::FinalReply(_) => "FinalReply",
            };
            println!("Received item type: {kind}");
            println!("Received item: {item:?}");
        }
        None => println!("No response received from agent"),
    }
    Ok(())
}
