use clap::{Parser, Subcommand};

/// Streaming chat console
#[derive(Debug, Parser)]
#[command(name = "chatloop")]
#[command(version)]
#[command(about = "Streaming chat console with pluggable backends", long_about = None)]
pub struct Args {
    /// Model name
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Backend (default: config/backend or "echo")
    #[arg(long = "backend")]
    pub backend: Option<String>,

    /// System prompt seeding the session
    #[arg(long = "system")]
    pub system: Option<String>,

    /// Fetch the whole reply at once instead of streaming
    #[arg(long = "no-stream")]
    pub no_stream: bool,

    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Prompt text (positional) (used when no subcommand is given)
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run an interactive multi-turn chat session
    Chat,
}
