//! agentdesk - tool-calling agent with cached results and durable history

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    history_command, init_command, plan_command, run_command, status_command, tools_command,
};

/// agentdesk - ask questions, plan goals, inspect history
#[derive(Parser)]
#[command(name = "agentdesk")]
#[command(about = "◆ A tool-calling agent with cached results and durable history")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and storage
    Init,
    /// Run a task through the agent
    Run {
        /// Task to run; omit for interactive mode
        #[arg(short, long)]
        message: Option<String>,
        /// Session ID
        #[arg(short, long, default_value = "default")]
        session: String,
        /// Only offer these tools (repeatable)
        #[arg(short, long = "tool")]
        tools: Vec<String>,
        /// Print the full result envelope as JSON
        #[arg(long)]
        json: bool,
    },
    /// Break a goal into a structured plan
    Plan {
        /// Goal to plan
        #[arg(short, long)]
        goal: String,
        /// Print the full result envelope as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored interactions of a session
    History {
        /// Session ID
        #[arg(short, long, default_value = "default")]
        session: String,
    },
    /// List available tools
    Tools,
    /// Show system status
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Run {
            message,
            session,
            tools,
            json,
        } => run_command(message, session, tools, json).await,
        Commands::Plan { goal, json } => plan_command(goal, json).await,
        Commands::History { session } => history_command(session).await,
        Commands::Tools => tools_command().await,
        Commands::Status => status_command().await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
