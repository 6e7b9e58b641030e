pub mod commands;
pub mod config;
pub mod db;
pub mod history;
pub mod offline;
pub mod pipeline;
pub mod providers;
pub mod state;

use config::AppConfig;
use db::{ConfigStore, SqliteStore};
use history::UndoCache;
use pipeline::{Dispatcher, MemorySurface, Orchestrator, PipelineEvent, Status, TextSurface};
use providers::HttpProvider;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Line typed on stdin that requests an explicit undo.
const UNDO_LINE: &str = ":undo";

/// Console runner: every stdin line becomes the content of one text field,
/// and the field is printed whenever a command changes it.
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let app_config = AppConfig::from_env();
    let store = Arc::new(SqliteStore::open(&app_config.db_path)?);
    if let Some(path) = &app_config.import_path {
        store.import_json(path)?;
    }
    if !store.load()?.is_app_enabled {
        tracing::warn!("Assistant is disabled; set isAppEnabled in the config to turn it on");
    }

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(store, Arc::new(HttpProvider::new()), Arc::new(UndoCache::new()))
        .with_status(status_tx);
    let orchestrator = Orchestrator::start(Arc::new(dispatcher));

    let surface = Arc::new(MemorySurface::new(1, ""));
    let printer_surface = surface.clone();
    let printer = tokio::spawn(async move {
        while let Some(event) = status_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => tracing::info!("status {}", json),
                Err(e) => tracing::warn!("unprintable status event: {}", e),
            }
            match &event.status {
                Status::Applied | Status::Undone => println!("{}", printer_surface.text()),
                Status::Failed(reason) => eprintln!("error: {reason}"),
                _ => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == UNDO_LINE {
            orchestrator.send(PipelineEvent::Undo)?;
            continue;
        }
        surface.set_text(line);
        orchestrator.send(PipelineEvent::Snapshot(surface.clone()))?;
    }

    orchestrator.shutdown().await?;
    printer.await?;
    Ok(())
}
