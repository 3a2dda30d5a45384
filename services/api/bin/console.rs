//! Interactive console for the Lingobot chat assistant.
//!
//! Reads one message per line from stdin. `history:` prints the last
//! request sent to the model, `/instructions <text>` sets the standing
//! instruction, `quit` or end of input exits.

use anyhow::Context;
use clap::Parser;
use lingobot_api::{
    config::Config,
    console::{ConsoleCommand, ConsoleSink, format_request},
    state::build_services,
    ws::session::GREETING,
};
use lingobot_core::ChatSession;
use std::{io::Write, path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Chat with the language-learning assistant from the terminal")]
struct Args {
    /// Standing instruction to start the conversation with.
    #[arg(long)]
    instructions: Option<String>,

    /// Directory where pronunciation clips are saved.
    #[arg(long)]
    audio_dir: Option<PathBuf>,
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let services = build_services(&config)?;
    let sink = Arc::new(ConsoleSink::new(args.audio_dir));
    let mut session = ChatSession::new(services, sink);
    if let Some(instructions) = &args.instructions {
        session.set_instruction(instructions).await;
    }
    info!(model = %config.chat_model, "Console session started.");

    println!("{GREETING}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match ConsoleCommand::parse(&line) {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Empty => {}
            ConsoleCommand::History => match session.last_request() {
                Some(request) => println!("{}", format_request(request)),
                None => println!("(no request sent yet)"),
            },
            ConsoleCommand::SetInstructions(text) => session.set_instruction(text).await,
            ConsoleCommand::Message(text) => session.process_message(text).await,
        }
        prompt()?;
    }

    info!("Console session finished.");
    Ok(())
}
