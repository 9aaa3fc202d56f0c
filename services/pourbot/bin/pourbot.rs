//! Main Entrypoint for the pourbot Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment (and CLI overrides).
//! 2. Initializing logging.
//! 3. Constructing the oracle client, action registry, and dispatcher.
//! 4. Running the transcript-monitoring loop until the first successful
//!    dispense, then exiting with status 0.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use clap::Parser;
use pourbot_core::{
    actions::{ActionRegistry, DispenseDrinkAction},
    dispatcher::Dispatcher,
    oracle::{OpenAiCompatibleOracle, Oracle},
    watcher::TranscriptWatcher,
};
use pourbot_service::{
    config::{Config, Provider},
    dispenser::CommandDispenser,
    prompt,
    runtime::Monitor,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

/// Watches a speech transcript and dispenses a drink when the oracle says so.
#[derive(Parser, Debug)]
#[command(name = "pourbot", version)]
struct Cli {
    /// Override the transcript file to watch.
    #[arg(long)]
    transcript: Option<PathBuf>,
    /// Override the poll interval in milliseconds.
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.transcript {
        config.transcript_path = path;
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing dispatcher...");

    // --- 3. Initialize the Oracle ---
    let system_prompt = prompt::load(config.system_prompt_path.as_deref())?;
    let oracle: Arc<dyn Oracle> = match &config.provider {
        Provider::OpenAi => {
            info!("Using OpenAI provider.");
            let api_key = config.openai_api_key.as_ref().unwrap();
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base("https://api.openai.com/v1/");
            Arc::new(OpenAiCompatibleOracle::new(
                openai_config,
                config.chat_model.clone(),
            ))
        }
        Provider::Gemini => {
            info!("Using Gemini provider.");
            let api_key = config.gemini_api_key.as_ref().unwrap();
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base("https://generativelanguage.googleapis.com/v1beta/openai");
            Arc::new(OpenAiCompatibleOracle::new(
                openai_config,
                config.chat_model.clone(),
            ))
        }
    };

    // --- 4. Register Actions ---
    let dispenser = Arc::new(CommandDispenser::new(config.dispense_command.clone()));
    let mut registry = ActionRegistry::new();
    registry.register(Arc::new(DispenseDrinkAction::new(dispenser)));

    // --- 5. Run the Monitoring Loop ---
    let dispatcher = Dispatcher::new(oracle, registry, system_prompt);
    let watcher = TranscriptWatcher::new(config.transcript_path.clone());
    let mut monitor = Monitor::new(
        watcher,
        dispatcher,
        config.poll_interval,
        config.flag_path.clone(),
    );

    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        transcript = %config.transcript_path.display(),
        "Dispenser assistant ready. Starting poll loop..."
    );
    monitor.run().await?;

    info!("Dispense completed. Exiting.");
    Ok(())
}
