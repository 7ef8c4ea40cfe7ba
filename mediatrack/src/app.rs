//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::cache::QueryCache;
use crate::config::{AppConfig, CACHE_FRESHNESS};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::EntriesService;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Repository,
    pub cache: QueryCache,
    pub entries_service: EntriesService,
}

impl AppState {
    pub fn new(config: AppConfig, db: Repository) -> Self {
        let cache = QueryCache::new(CACHE_FRESHNESS);
        let entries_service = EntriesService::new(db.clone(), cache.clone());

        Self {
            config,
            db,
            cache,
            entries_service,
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: AppConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)?;

    let pool = create_pool(&config.database_path()).await?;
    let state = AppState::new(config, Repository::new(pool));

    tracing::info!("Application initialized successfully");

    Ok(state)
}
