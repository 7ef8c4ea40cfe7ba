//! Application configuration
//!
//! Central location for configuration constants, resource limits and
//! validation boundaries, plus the small amount of runtime configuration
//! (where the library database lives).

use std::path::PathBuf;
use std::time::Duration;

// ===== Storage =====

/// Database file created inside the data directory
pub const DEFAULT_DATABASE_FILE: &str = "mediatrack.db";

/// Overrides the data directory (defaults to the working directory)
pub const DATA_DIR_ENV: &str = "MEDIATRACK_DATA_DIR";

/// Overrides the database file name
pub const DATABASE_FILE_ENV: &str = "MEDIATRACK_DB_FILE";

/// Connections in the application pool
pub const POOL_MAX_CONNECTIONS: u32 = 5;

/// How long a connection waits on a locked database before failing
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ===== Query cache =====

/// Cached query results older than this are refetched
pub const CACHE_FRESHNESS: Duration = Duration::from_secs(2 * 60);

// ===== Entry form limits =====

/// Maximum length of an entry title
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum length of a category name
pub const MAX_CATEGORY_LENGTH: usize = 100;

/// Earliest accepted release year
pub const MIN_RELEASE_YEAR: i64 = 1800;

/// Latest accepted release year
pub const MAX_RELEASE_YEAR: i64 = 2200;

/// Runtime configuration resolved at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let data_dir = std::env::var(DATA_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let database_file = std::env::var(DATABASE_FILE_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.database_file);

        Self {
            data_dir,
            database_file,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}
