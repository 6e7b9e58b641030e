use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use super::dispatch::Dispatcher;
use super::surface::TextSurface;

pub enum PipelineEvent {
    /// The text of a surface changed.
    Snapshot(Arc<dyn TextSurface>),
    Undo,
    Stop,
}

/// Feeds observed snapshots to the dispatcher without blocking the observer.
/// Each snapshot runs in its own task; `Stop` waits for those still running.
pub struct Orchestrator {
    pub event_tx: mpsc::UnboundedSender<PipelineEvent>,
    task: JoinHandle<()>,
}

impl Orchestrator {
    pub fn start(dispatcher: Arc<Dispatcher>) -> Self {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<PipelineEvent>();

        let task = tokio::spawn(async move {
            let mut running: JoinSet<()> = JoinSet::new();
            while let Some(event) = event_rx.recv().await {
                match event {
                    PipelineEvent::Snapshot(surface) => {
                        let dispatcher = dispatcher.clone();
                        running.spawn(async move {
                            let id = surface.id();
                            let outcome = dispatcher.process(surface).await;
                            tracing::debug!("surface {}: {:?}", id, outcome);
                        });
                    }
                    PipelineEvent::Undo => {
                        dispatcher.undo();
                    }
                    PipelineEvent::Stop => break,
                }
                while let Some(done) = running.try_join_next() {
                    if let Err(e) = done {
                        tracing::error!("Dispatch task failed: {}", e);
                    }
                }
            }
            while let Some(done) = running.join_next().await {
                if let Err(e) = done {
                    tracing::error!("Dispatch task failed: {}", e);
                }
            }
        });

        Self { event_tx, task }
    }

    pub fn send(&self, event: PipelineEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .map_err(|_| anyhow!("orchestrator has stopped"))
    }

    /// Stops accepting events and waits for in-flight snapshots.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.event_tx.send(PipelineEvent::Stop);
        self.task.await?;
        Ok(())
    }
}
