//! agentdesk command implementations

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use agentdesk_agent::{AgentCore, PlanningCore, ResultEnvelope};
use agentdesk_config::{self, Config};
use agentdesk_provider::{KeywordReasoner, OpenAiReasoner, Reasoner};
use agentdesk_session::{InteractionStore, JsonlInteractionStore};

/// OpenAI-compatible reasoner when a key is configured, offline otherwise
fn reasoner_for(config: &Config) -> Arc<dyn Reasoner> {
    match config.api_key() {
        Some(api_key) => Arc::new(
            OpenAiReasoner::new(api_key, config.api_base(), Some(config.agent.model.clone()))
                .with_sampling(config.agent.max_tokens, config.agent.temperature),
        ),
        None => {
            info!("No API key configured, using the offline keyword reasoner");
            Arc::new(KeywordReasoner::new())
        }
    }
}

fn build_core(config: &Config) -> AgentCore {
    let store = Arc::new(JsonlInteractionStore::new(config.interactions_path()));
    AgentCore::from_config(config, reasoner_for(config), store)
}

fn print_envelope(envelope: &ResultEnvelope, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(envelope)?);
    } else if !envelope.response.is_empty() {
        println!("\n◆ {}", envelope.response);
        if !envelope.tools_used.is_empty() {
            println!("  tools: {}", envelope.tools_used.join(", "));
        }
    }

    if let Some(error) = envelope.error.as_deref().filter(|e| !e.is_empty()) {
        anyhow::bail!("{}", error);
    }
    Ok(())
}

/// Initialize config and storage
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing agentdesk...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = agentdesk_config::init()
        .await
        .context("Failed to initialize configuration")?;

    println!("Config:       {}", agentdesk_config::config_path().display());
    println!("Interactions: {}", config.interactions_path().display());
    println!("\n◆ agentdesk initialized");
    println!("\nNext steps:");
    println!("  1. Set OPENAI_API_KEY or add a key to ~/.agentdesk/config.json");
    println!("     Without a key the offline keyword reasoner is used");
    println!("  2. Ask something: agentdesk run -m \"What is 2+3?\"");

    Ok(())
}

/// Run one task, or read tasks from stdin until `exit`
pub async fn run_command(
    message: Option<String>,
    session: String,
    tools: Vec<String>,
    json: bool,
) -> Result<()> {
    let config = Config::load().await.context("Failed to load config")?;
    let core = build_core(&config);
    let filter = (!tools.is_empty()).then_some(tools);

    if let Some(msg) = message {
        let envelope = core
            .run_with_tools(&msg, &session, filter.as_deref())
            .await;
        return print_envelope(&envelope, json);
    }

    println!("◆ Interactive mode (type 'exit' to quit)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    loop {
        print!("◆ ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        let envelope = core
            .run_with_tools(input, &session, filter.as_deref())
            .await;
        // a failed turn does not end the session
        if let Err(e) = print_envelope(&envelope, json) {
            eprintln!("✗ {}", e);
        }
        println!();
    }

    Ok(())
}

/// Plan a goal through the planning core
pub async fn plan_command(goal: String, json: bool) -> Result<()> {
    let config = Config::load().await.context("Failed to load config")?;
    let core = Arc::new(build_core(&config));
    let planner = PlanningCore::new(core)
        .await
        .context("Failed to set up the planner")?;

    let envelope = planner.create_plan(&goal).await;
    print_envelope(&envelope, json)
}

/// Print a session's interactions as JSON
pub async fn history_command(session: String) -> Result<()> {
    let config = Config::load().await.context("Failed to load config")?;
    let core = build_core(&config);

    let history = core
        .history(&session)
        .await
        .with_context(|| format!("Failed to read history of session {}", session))?;
    println!("{}", serde_json::to_string_pretty(&history)?);
    Ok(())
}

/// Print tool descriptors as JSON
pub async fn tools_command() -> Result<()> {
    let config = Config::load().await.context("Failed to load config")?;
    let core = build_core(&config);

    let definitions = core.tools().await.definitions();
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}

/// Show configuration and store statistics
pub async fn status_command() -> Result<()> {
    let config_path = agentdesk_config::config_path();

    println!("◆ agentdesk System Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config:       {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await.context("Failed to load config")?;
    let interactions = config.interactions_path();
    println!(
        "Interactions: {} {}",
        interactions.display(),
        if interactions.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );
    println!("Model:        {}", config.agent.model);
    println!(
        "API Key:      {}",
        if config.has_api_key() {
            "[Set]"
        } else {
            "[Missing, offline mode]"
        }
    );
    println!(
        "Loop:         {} iterations, {:?} early stopping",
        config.agent.max_iterations, config.agent.early_stopping
    );
    println!(
        "Cache TTL:    agent {}s, rag {}s",
        config.cache.agent_ttl_secs, config.cache.rag_ttl_secs
    );

    let store = JsonlInteractionStore::new(&interactions);
    let stats = store
        .stats()
        .await
        .context("Failed to read interaction statistics")?;
    println!(
        "Stored:       {} sessions, {} interactions",
        stats.sessions, stats.interactions
    );

    println!("\n◆ Ready");

    Ok(())
}
