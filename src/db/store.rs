use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use rusqlite::Connection;
use std::path::Path;

use super::{schema, settings, snippets, ConfigStore};
use crate::config::{AssistConfig, Snippet};

const CONFIG_KEY: &str = "config_json";

/// Configuration in SQLite: the document under `settings.config_json`,
/// snippets in their own table so a save touches one row.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = schema::init_db(path)?;
        tracing::info!("Config store at {}", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::create_tables(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Replaces the stored configuration, snippets included.
    pub fn save(&self, config: &AssistConfig) -> Result<()> {
        let mut conn = self.conn.lock();
        Self::write(&mut conn, config)
    }

    /// Loads a JSON export and stores it over the current configuration.
    pub fn import_json(&self, path: &Path) -> Result<AssistConfig> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = AssistConfig::from_json(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        self.save(&config)?;
        tracing::info!(
            "Imported config from {} ({} triggers, {} snippets)",
            path.display(),
            config.triggers.len(),
            config.snippets.len()
        );
        Ok(config)
    }

    /// Writes the current configuration, snippets included, as pretty JSON.
    pub fn export_json(&self, path: &Path) -> Result<()> {
        let config = self.load()?;
        let json = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("Exported config to {}", path.display());
        Ok(())
    }

    fn write(conn: &mut Connection, config: &AssistConfig) -> Result<()> {
        settings::set_json(conn, CONFIG_KEY, config)?;
        snippets::replace_all(conn, &config.snippets)
    }
}

impl ConfigStore for SqliteStore {
    fn load(&self) -> Result<AssistConfig> {
        let mut conn = self.conn.lock();
        let mut config = match settings::get_json::<AssistConfig>(&conn, CONFIG_KEY)? {
            Some(config) => config,
            None => {
                tracing::info!("No stored config, seeding defaults");
                let config = AssistConfig::default();
                Self::write(&mut conn, &config)?;
                config
            }
        };
        config.snippets = snippets::get_all(&conn)?;
        Ok(config.normalized())
    }

    fn upsert_snippet(&self, snippet: Snippet) -> Result<()> {
        let conn = self.conn.lock();
        snippets::upsert(&conn, &snippet)
    }
}

/// Keeps the configuration in memory only.
#[derive(Default)]
pub struct MemoryStore {
    config: RwLock<AssistConfig>,
}

impl MemoryStore {
    pub fn new(config: AssistConfig) -> Self {
        Self { config: RwLock::new(config.normalized()) }
    }

    pub fn update(&self, f: impl FnOnce(&mut AssistConfig)) {
        f(&mut self.config.write());
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<AssistConfig> {
        Ok(self.config.read().clone())
    }

    fn upsert_snippet(&self, snippet: Snippet) -> Result<()> {
        self.config.write().upsert_snippet(snippet);
        Ok(())
    }
}
