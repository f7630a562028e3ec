//! Queen's Wardrobe - an interactive romance story narrated by an LLM
//!
//! A terminal front end driving a game state machine: a talent draw,
//! companion selection, then free-form play with a hosted narrator.

mod catalog;
mod config;
mod gateway;
mod llm;
mod model;
mod runtime;
mod state_machine;
mod store;
mod terminal;

use catalog::Catalog;
use config::AppConfig;
use gateway::ConversationGateway;
use llm::GeminiConnector;
use state_machine::GameContext;
use std::sync::Arc;
use store::{KvBackend, MemoryKv, SaveStore, SqliteKv};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the story on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "queens_wardrobe=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from_env();

    // Ensure save directory exists
    if let Some(parent) = config.save_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %e, "Cannot create save directory");
        }
    }

    // The game stays playable without a save slot; progress just won't outlive the process
    tracing::info!(path = %config.save_path.display(), "Opening save slot");
    let backend: Arc<dyn KvBackend> = match SqliteKv::open(&config.save_path) {
        Ok(kv) => Arc::new(kv),
        Err(e) => {
            tracing::warn!(error = %e, "Save slot unavailable; keeping progress in memory");
            println!("Warning: progress will not be saved ({e})");
            Arc::new(MemoryKv::new())
        }
    };
    let store = Arc::new(SaveStore::new(backend));

    if config.credential.is_none() {
        tracing::info!("GEMINI_API_KEY not set; the key must be given with `new` or `resume`");
    }
    tracing::info!(model = %config.llm.model, "Narrator configured");

    let gateway = Arc::new(ConversationGateway::new(
        Arc::new(GeminiConnector::new(config.llm.clone())),
        config.llm.clone(),
    ));
    let catalog = Arc::new(Catalog::builtin());
    let context = GameContext::new(catalog.clone(), config.timings);

    let handle = runtime::spawn_game(context, store, gateway);
    terminal::run(handle, catalog, config.credential).await?;

    Ok(())
}
