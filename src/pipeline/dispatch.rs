use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::surface::{SurfaceId, TextSurface};
use crate::commands::{Action, CommandMatcher};
use crate::config::Snippet;
use crate::db::ConfigStore;
use crate::history::UndoCache;
use crate::offline;
use crate::providers::{Provider, ProviderRequest};
use crate::state::{Phase, SurfaceStates};

pub type SurfaceCache = UndoCache<Arc<dyn TextSurface>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Status {
    Working,
    Idle,
    Applied,
    Undone,
    NothingToUndo,
    SnippetSaved(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub surface: Option<SurfaceId>,
    #[serde(flatten)]
    pub status: Status,
}

/// What one snapshot or undo request led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Disabled,
    NoAction,
    /// A provider call for this surface is still pending.
    Busy,
    /// The surface now holds this text.
    Applied(String),
    Failed(String),
    /// The surface changed while the provider was working.
    Stale,
    Undone,
    NothingToUndo,
}

pub struct Dispatcher {
    store: Arc<dyn ConfigStore>,
    provider: Arc<dyn Provider>,
    cache: Arc<SurfaceCache>,
    states: Mutex<SurfaceStates>,
    status_tx: Option<mpsc::UnboundedSender<StatusEvent>>,
}

struct PendingGuard<'a> {
    states: &'a Mutex<SurfaceStates>,
    id: SurfaceId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut states = self.states.lock();
        states.end_remote(self.id);
        states.set_idle(self.id);
    }
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        provider: Arc<dyn Provider>,
        cache: Arc<SurfaceCache>,
    ) -> Self {
        Self {
            store,
            provider,
            cache,
            states: Mutex::new(SurfaceStates::new()),
            status_tx: None,
        }
    }

    pub fn with_status(mut self, tx: mpsc::UnboundedSender<StatusEvent>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    pub fn cache(&self) -> &Arc<SurfaceCache> {
        &self.cache
    }

    pub fn phase(&self, id: SurfaceId) -> Phase {
        self.states.lock().phase(id)
    }

    pub fn undo_available(&self) -> bool {
        self.cache.undo_available()
    }

    /// Matches the current text of `surface` and carries out at most one
    /// command.
    pub async fn process(&self, surface: Arc<dyn TextSurface>) -> Outcome {
        let id = surface.id();
        let snapshot = surface.text();

        let config = match self.store.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config: {:#}", e);
                return Outcome::Failed(e.to_string());
            }
        };
        if !config.is_app_enabled {
            return Outcome::Disabled;
        }

        {
            let mut states = self.states.lock();
            if states.take_restored(id, &snapshot) {
                tracing::debug!("surface {} shows the text undo restored, skipping", id);
                return Outcome::NoAction;
            }
            if !states.begin_matching(id) {
                tracing::debug!("surface {} has a call pending, ignoring snapshot", id);
                return Outcome::Busy;
            }
        }

        let Some(action) = CommandMatcher::new(&config).classify(&snapshot) else {
            self.states.lock().set_idle(id);
            return Outcome::NoAction;
        };
        tracing::info!("surface {}: {} command", id, action.label());

        match &action {
            Action::Undo => {
                self.states.lock().set_idle(id);
                self.undo()
            }
            Action::Inline { prompt, operand, .. } | Action::Trailing { prompt, operand } => {
                let request = ProviderRequest {
                    system_prompt: prompt.clone(),
                    user_text: operand.clone(),
                    config: config.provider_config(),
                };
                self.dispatch_remote(&surface, &action, &snapshot, request).await
            }
            Action::SaveSnippet { name, content, .. } => {
                self.states.lock().set_resolving(id);
                let snippet = Snippet {
                    trigger: name.clone(),
                    content: content.clone(),
                };
                if let Err(e) = self.store.upsert_snippet(snippet) {
                    tracing::error!("Failed to save snippet {:?}: {:#}", name, e);
                    self.states.lock().set_idle(id);
                    return self.fail(id, e.to_string());
                }
                tracing::info!("Saved snippet {:?}", name);
                self.emit(Some(id), Status::SnippetSaved(name.clone()));
                self.apply(&surface, &action, &snapshot, "")
            }
            Action::ExpandSnippet { key, .. } => {
                self.states.lock().set_resolving(id);
                match offline::expand_snippet(&config.snippets, key) {
                    Some(content) => self.apply(&surface, &action, &snapshot, content),
                    None => {
                        self.states.lock().set_idle(id);
                        Outcome::NoAction
                    }
                }
            }
            Action::Utility { utility, .. } => {
                self.states.lock().set_resolving(id);
                let result = offline::resolve_utility(utility);
                self.apply(&surface, &action, &snapshot, &result)
            }
        }
    }

    /// Restores the text recorded before the last replacement.
    pub fn undo(&self) -> Outcome {
        let Some((text, target)) = self.cache.undo() else {
            tracing::info!("Nothing to undo");
            self.emit(None, Status::NothingToUndo);
            return Outcome::NothingToUndo;
        };
        let id = target.id();
        if let Err(e) = target.replace(&text) {
            tracing::error!("Undo on surface {} failed: {:#}", id, e);
            return self.fail(id, e.to_string());
        }
        self.states.lock().mark_restored(id, &text);
        tracing::info!("Undone on surface {}", id);
        self.emit(Some(id), Status::Undone);
        Outcome::Undone
    }

    async fn dispatch_remote(
        &self,
        surface: &Arc<dyn TextSurface>,
        action: &Action,
        snapshot: &str,
        request: ProviderRequest,
    ) -> Outcome {
        let id = surface.id();
        if !self.states.lock().begin_remote(id) {
            return Outcome::Busy;
        }
        let guard = PendingGuard {
            states: &self.states,
            id,
        };
        self.emit(Some(id), Status::Working);

        let result = self.provider.dispatch(request).await;
        self.emit(Some(id), Status::Idle);

        let text = match result {
            Ok(text) => text,
            Err(e) => return self.fail(id, e.to_string()),
        };
        if surface.text() != snapshot {
            tracing::info!("surface {} changed during the call, discarding result", id);
            return Outcome::Stale;
        }
        let outcome = self.apply(surface, action, snapshot, &text);
        drop(guard);
        outcome
    }

    fn apply(
        &self,
        surface: &Arc<dyn TextSurface>,
        action: &Action,
        snapshot: &str,
        result: &str,
    ) -> Outcome {
        let id = surface.id();
        self.states.lock().set_applying(id);
        let replaced = action.splice(snapshot, result);
        let outcome = match surface.replace(&replaced) {
            Ok(()) => {
                self.cache.record(snapshot, surface.clone());
                self.emit(Some(id), Status::Applied);
                Outcome::Applied(replaced)
            }
            Err(e) => {
                tracing::error!("Replacing text on surface {} failed: {:#}", id, e);
                self.fail(id, e.to_string())
            }
        };
        self.states.lock().set_idle(id);
        outcome
    }

    fn fail(&self, id: SurfaceId, reason: String) -> Outcome {
        self.emit(Some(id), Status::Failed(reason.clone()));
        Outcome::Failed(reason)
    }

    fn emit(&self, surface: Option<SurfaceId>, status: Status) {
        if let Some(tx) = &self.status_tx {
            let _ = tx.send(StatusEvent { surface, status });
        }
    }
}
