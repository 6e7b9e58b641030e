//! Persistence for the command configuration.

pub mod schema;
pub mod settings;
pub mod snippets;
pub mod store;

use anyhow::Result;

use crate::config::{AssistConfig, Snippet};

pub use store::{MemoryStore, SqliteStore};

/// Source of the current configuration. `load` is called once per snapshot,
/// so edits take effect on the next keystroke.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<AssistConfig>;

    fn upsert_snippet(&self, snippet: Snippet) -> Result<()>;
}
