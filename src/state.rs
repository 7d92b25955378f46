//! Application state management

use crate::config::Config;
use crate::engine::Engine;
use crate::seed::SeedData;
use crate::store::Store;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Application state holding the engine and the configuration it was built from
pub struct AppState {
    pub engine: Arc<Engine>,
    pub config: Config,
}

impl AppState {
    /// Initialize application state.
    ///
    /// Opens the database under the configured data directory, seeds it on
    /// first run, then loads the engine from it.
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.db_path();
        let store = Store::open(&db_path)
            .with_context(|| format!("Failed to open database at {:?}", db_path))?;

        if store.is_empty()? {
            let seed = match &config.seed_dir {
                Some(dir) => SeedData::from_dir(dir)?,
                None => SeedData::bundled(),
            };
            tracing::info!(
                "Seeding empty database with {} roots, {} schemes, {} transformation groups",
                seed.roots.len(),
                seed.schemes.len(),
                seed.groups.len()
            );
            store.import(&seed).context("Failed to seed database")?;
        }

        let engine = Arc::new(Engine::with_store(store)?);
        Ok(Self { engine, config })
    }
}
