//! Server configuration
//!
//! All settings come from environment variables with sane defaults:
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/counter | Working directory (database, logs) |
//! | LOCATION_ID | main | Location identifier stamped on orders |
//! | LOG_LEVEL | info | Log verbosity |
//! | LOG_DIR | (none) | Optional directory for rolling log files |
//! | ENVIRONMENT | development | development \| production |

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// Location identifier stamped on new orders
    pub location_id: String,
    /// Log verbosity
    pub log_level: String,
    /// Optional directory for rolling log files
    pub log_dir: Option<String>,
    /// Running environment: development | production
    pub environment: String,
}

impl Config {
    /// Load configuration, reading a `.env` file first if present
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Build configuration from environment variables only
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/counter".into()),
            location_id: std::env::var("LOCATION_ID").unwrap_or_else(|_| "main".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Path of the order database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
