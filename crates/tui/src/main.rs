use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kanban::TaskStore;

mod api;
mod app;
mod config;
mod demo;
mod editor;
mod input;
mod state;
mod terminal;
mod ui;

use api::ApiClient;
use app::App;
use config::{Config, StoreConfig};
use terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = Config::load()?;
    tracing::info!(statuses = config.sequence.len(), "starting bimboard");

    match config.store {
        StoreConfig::Remote { api_url, api_key } => {
            let client = ApiClient::new(&api_url, &api_key);
            if let Err(error) = client.health_check().await {
                // Still start; the board shows the store as disconnected.
                tracing::warn!(api_url = %api_url, error = %error, "store is not reachable");
            }
            run(Arc::new(client), config.sequence, config.project_id).await
        }
        StoreConfig::Demo => {
            tracing::info!("no api_url configured, using demo data");
            let store = demo::demo_store(config.sequence.clone());
            let project_id = config
                .project_id
                .or_else(|| Some(demo::PROJECT_ID.to_string()));
            run(Arc::new(store), config.sequence, project_id).await
        }
    }
}

async fn run<S: TaskStore + 'static>(
    store: Arc<S>,
    sequence: kanban::StatusSequence,
    project_id: Option<String>,
) -> Result<()> {
    let mut app = App::new(store, sequence, project_id).await;

    let mut terminal = Terminal::new()?;
    let result = app.run(&mut terminal).await;
    terminal.restore()?;

    result
}

fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("warn,bimboard=info,kanban=info,tui=info")
    });

    // Write logs to file instead of stderr to avoid breaking TUI
    let log_dir = config::config_dir()?;
    let log_path = log_dir.join("bimboard.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {:?}", log_path))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}
