//! `cardwise agent` — Interactive or single-message chat mode.

use cardwise_agent::{AGENT_NAME, AgentService};
use cardwise_config::AppConfig;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Printed when a turn ends without an answer.
const NO_ANSWER: &str = "(no answer; the model call failed or ran out of steps, see /trace)";

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Trace,
    Clear,
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "exit" | "quit" | "/exit" | "/quit" => Input::Exit,
        "/trace" => Input::Trace,
        "/clear" => Input::Clear,
        text => Input::Message(text),
    }
}

pub async fn run(
    message: Option<String>,
    session: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let store = Arc::new(cardwise_gateway::session_store(&config));
    let service = match cardwise_gateway::build_agent_service(&config, store) {
        Ok(service) => service,
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    CARDWISE_API_KEY = 'sk-...'");
            eprintln!("    OPENAI_API_KEY   = 'sk-...'");
            eprintln!();
            eprintln!("  Or add `api_key` to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err(e.into());
        }
    };

    let session = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = service.process_turn(&session, &msg).await?;
        eprint!("\r              \r");
        if outcome.answer.is_empty() {
            eprintln!("{NO_ANSWER}");
        } else {
            println!("{}", outcome.answer);
        }
        return Ok(());
    }

    println!();
    println!("  Cardwise — {AGENT_NAME}, KK Credit Cards");
    println!();
    println!("  Model:     {}", config.provider.model);
    println!("  Tools:     {}", service.controller().tools().names().join(", "));
    println!("  Session:   {session}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  /trace shows the last turn's reasoning, /clear starts over.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    interactive(&service, &session).await?;

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

async fn interactive(
    service: &AgentService,
    session: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    debug!(session = %session, "Interactive session started");

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Empty => {}
            Input::Exit => break,
            Input::Trace => {
                let trace = service.get_trace(session).await?;
                if trace.is_empty() {
                    println!("  (no trace yet)");
                } else {
                    for line in trace.lines() {
                        println!("  | {line}");
                    }
                }
            }
            Input::Clear => {
                service.clear_session(session).await?;
                println!("  Session cleared.");
            }
            Input::Message(text) => {
                eprint!("  ...");
                let result = service.process_turn(session, text).await;
                eprint!("\r     \r");
                match result {
                    Ok(outcome) if outcome.answer.is_empty() => println!("  {NO_ANSWER}"),
                    Ok(outcome) => {
                        println!();
                        for line in outcome.answer.lines() {
                            println!("  {AGENT_NAME} > {line}");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Turn failed");
                        eprintln!("  [Error] {e}");
                    }
                }
                println!();
            }
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
