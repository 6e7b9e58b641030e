use std::collections::{HashMap, HashSet};

use crate::pipeline::surface::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Matching,
    LocalResolving,
    RemotePending,
    Applying,
}

/// Per-surface dispatch phases plus the set of surfaces with a provider
/// call in flight. The pending set is tracked apart from the phase so a
/// second snapshot that finds nothing to do cannot clear the guard.
#[derive(Debug, Default)]
pub struct SurfaceStates {
    phases: HashMap<SurfaceId, Phase>,
    pending: HashSet<SurfaceId>,
    restored: HashMap<SurfaceId, String>,
}

impl SurfaceStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, id: SurfaceId) -> Phase {
        if self.pending.contains(&id) {
            return Phase::RemotePending;
        }
        self.phases.get(&id).copied().unwrap_or(Phase::Idle)
    }

    /// Starts matching unless a provider call for `id` is in flight.
    pub fn begin_matching(&mut self, id: SurfaceId) -> bool {
        if self.pending.contains(&id) {
            return false;
        }
        self.phases.insert(id, Phase::Matching);
        true
    }

    pub fn set_resolving(&mut self, id: SurfaceId) {
        self.phases.insert(id, Phase::LocalResolving);
    }

    pub fn set_applying(&mut self, id: SurfaceId) {
        self.phases.insert(id, Phase::Applying);
    }

    pub fn set_idle(&mut self, id: SurfaceId) {
        self.phases.remove(&id);
    }

    /// Claims the in-flight slot for `id`; false if it is already taken.
    pub fn begin_remote(&mut self, id: SurfaceId) -> bool {
        self.pending.insert(id)
    }

    pub fn end_remote(&mut self, id: SurfaceId) {
        self.pending.remove(&id);
    }

    /// Remembers text put back by an undo so its echo is not re-dispatched.
    pub fn mark_restored(&mut self, id: SurfaceId, text: &str) {
        self.restored.insert(id, text.to_string());
    }

    /// True once if `snapshot` is the text last restored on `id`.
    pub fn take_restored(&mut self, id: SurfaceId, snapshot: &str) -> bool {
        match self.restored.remove(&id) {
            Some(text) => text == snapshot,
            None => false,
        }
    }
}
