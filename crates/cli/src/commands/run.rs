//! Run command - scripted scenarios followed by an interactive session

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::chat::{Pipeline, build_pipeline};
use crate::args::RunArgs;
use crate::config::AppConfig;
use crate::scenarios::{preview, scenarios};

/// Turns shown by the `history` command
const HISTORY_SHOWN: usize = 5;

/// A line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Quit,
    History,
    Clear,
    Message(&'a str),
}

impl<'a> ReplCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "quit" => Self::Quit,
            "history" => Self::History,
            "clear" => Self::Clear,
            _ => Self::Message(trimmed),
        }
    }
}

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let mut pipeline = build_pipeline(&config)
        .await
        .context("Failed to initialize the chatbot")?;

    if !args.skip_scenarios {
        run_scenarios(&mut pipeline).await;
    }

    if !args.scenarios_only {
        interactive(&mut pipeline).await?;
    }

    tracing::info!(turns = pipeline.history().len(), "Session finished");
    Ok(())
}

async fn run_scenarios(pipeline: &mut Pipeline) {
    println!();
    println!("{}", "=".repeat(50));
    println!("RUNNING GUARDRAIL TEST SCENARIOS");
    println!("{}", "=".repeat(50));

    for (i, scenario) in scenarios().iter().enumerate() {
        tracing::debug!(case = i + 1, category = scenario.category.label(), "Running scenario");

        println!();
        println!("--- Test Case {} ---", i + 1);
        println!("Input: {}", preview(&scenario.input));

        let response = pipeline.process_turn(&scenario.input).await;
        println!("Response: {}", response);
        println!("{}", "-".repeat(30));
    }
}

async fn interactive(pipeline: &mut Pipeline) -> Result<()> {
    println!();
    println!("{}", "=".repeat(50));
    println!("INTERACTIVE CHAT MODE");
    println!("Type 'quit' to exit, 'history' to see conversation history, 'clear' to reset it");
    println!("{}", "=".repeat(50));

    let mut lines = spawn_stdin_reader();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Interrupt received");
    };
    tokio::pin!(shutdown);

    loop {
        print!("\nYou: ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let line = tokio::select! {
            line = lines.recv() => line.transpose().context("Failed to read from stdin")?,
            _ = &mut shutdown => {
                println!("\nGoodbye!");
                break;
            }
        };

        // End of input behaves like quit
        let Some(line) = line else {
            println!("\nGoodbye!");
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Quit => {
                println!("Goodbye!");
                break;
            }
            ReplCommand::History => print_history(pipeline),
            ReplCommand::Clear => {
                pipeline.clear();
                println!("Conversation history cleared.");
            }
            ReplCommand::Message(text) => {
                let response = tokio::select! {
                    response = pipeline.process_turn(text) => response,
                    _ = &mut shutdown => {
                        println!("\nGoodbye!");
                        break;
                    }
                };
                println!("\nBot: {}", response);
            }
        }
    }

    Ok(())
}

/// Read stdin lines on a plain thread so a pending read never holds up shutdown
fn spawn_stdin_reader() -> mpsc::Receiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_history(pipeline: &Pipeline) {
    println!("\n--- Conversation History ---");
    for turn in pipeline.recent(HISTORY_SHOWN) {
        println!("User: {}", turn.user_input);
        println!("Bot: {}", turn.bot_response);
        println!("Time: {}", format_timestamp(turn.timestamp));
        println!("{}", "-".repeat(20));
    }
}

fn format_timestamp(timestamp: time::OffsetDateTime) -> String {
    timestamp
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| timestamp.to_string())
}
