//! Bridge probe - run one editor → form sync against a document file
//!
//! Usage:
//!   bridge_probe --document demos/document.json
//!   bridge_probe --config config/bridge.toml --environment production --document doc.json
//!   bridge_probe --document doc.json --strategy paragraph-fallback

use anyhow::{bail, Context, Result};
use bridge_adapters::stores::{InMemoryEditorStore, InMemoryFormStore};
use bridge_adapters::BridgeSession;
use clap::Parser;
use config::{load_settings, LoggingSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use types::TransformationStrategy;

#[derive(Parser, Debug)]
#[command(name = "bridge_probe")]
#[command(about = "Sync an editor document into an in-memory multi-step form")]
#[command(version)]
struct Args {
    /// Path to the settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment override to layer over the settings file
    #[arg(short, long)]
    environment: Option<String>,

    /// Editor document JSON: { "containers": [..], "paragraphs": [..] }
    #[arg(short, long)]
    document: PathBuf,

    /// Transformation strategy (existing-content, rebuild-from-containers,
    /// paragraph-fallback, auto)
    #[arg(short, long)]
    strategy: Option<TransformationStrategy>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref(), args.environment.as_deref())
        .context("Failed to load bridge settings")?;
    init_logging(&settings.logging);

    if let Some(strategy) = args.strategy {
        settings.transformation.strategy = strategy;
    }
    info!("Strategy: {}", settings.transformation.strategy);

    let raw = std::fs::read_to_string(&args.document)
        .with_context(|| format!("Failed to read {}", args.document.display()))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.document.display()))?;

    let editor_store = InMemoryEditorStore::from_document(&document)?;
    let session = BridgeSession::new(
        settings,
        Arc::new(editor_store),
        Arc::new(InMemoryFormStore::new()),
    );

    if !session.connect_all().await {
        error!("Could not connect both adapters");
        bail!("connection failed");
    }

    let Some(outcome) = session.sync_editor_to_form().await else {
        bail!("editor snapshot could not be extracted");
    };
    if !outcome.result.transformation_success {
        error!(errors = ?outcome.result.transformation_errors, "Transformation failed");
    }
    info!(
        applied = outcome.applied,
        strategy = %outcome.result.strategy,
        "Sync finished"
    );

    let Some(snapshot) = session.multi_step().extract_data().await else {
        bail!("form snapshot could not be extracted");
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    let stats = session.engine().cache_stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        "Transformation cache"
    );

    session.disconnect_all().await;
    Ok(())
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    if logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
