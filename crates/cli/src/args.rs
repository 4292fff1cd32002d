//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// guardrail-chat: a chatbot with input filters and response quality checks
#[derive(Parser, Debug)]
#[command(name = "guardrail-chat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scripted scenarios, then chat interactively
    Run(RunArgs),

    /// Send a single message through the guardrails
    Chat(ChatArgs),

    /// Inspect the keyword filters
    Filters(FiltersArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Go straight to the interactive session
    #[arg(long, conflicts_with = "scenarios_only")]
    pub skip_scenarios: bool,

    /// Run the scripted scenarios and exit
    #[arg(long)]
    pub scenarios_only: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Message to send
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing the message (use - for stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct FiltersArgs {
    #[command(subcommand)]
    pub command: FiltersCommands,
}

#[derive(Subcommand, Debug)]
pub enum FiltersCommands {
    /// List the configured keywords
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify text without calling the model
    Check {
        /// Text to check
        #[arg(long)]
        text: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
