//! Worker configuration loaded from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use procesal_sync::SweepSchedule;
use thiserror::Error;

/// Configuration error during startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Runtime configuration for the sweeper worker.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,

    /// Log filter directive.
    pub rust_log: String,

    /// Override for the Rama Judicial base URL (staging proxies).
    pub rama_base_url: Option<String>,

    /// When sweeps run (`daily@<utc hour>` or `every@<seconds>`).
    pub schedule: SweepSchedule,

    /// Pause between consecutive cases within a sweep.
    pub pause_between_cases: Duration,

    /// Run one sweep immediately on startup before entering the schedule.
    pub sweep_on_startup: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Required Variables
    ///
    /// - `DATABASE_URL` - PostgreSQL connection string
    ///
    /// # Optional Variables
    ///
    /// - `RUST_LOG` - Log level filter (default: "info")
    /// - `RAMA_BASE_URL` - override for the Colombia court API base URL
    /// - `SWEEP_SCHEDULE` - `daily@<utc hour>` or `every@<seconds>`
    ///   (default: "daily@5")
    /// - `SWEEP_PAUSE_MS` - pause between cases in milliseconds
    ///   (default: 1000)
    /// - `SWEEP_ON_STARTUP` - run a sweep immediately (default: "false")
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development only)
        let _ = dotenvy::dotenv();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let rama_base_url = env::var("RAMA_BASE_URL").ok().filter(|v| !v.is_empty());

        let schedule_raw = env::var("SWEEP_SCHEDULE").unwrap_or_else(|_| "daily@5".to_string());
        let schedule =
            SweepSchedule::from_str(&schedule_raw).map_err(|message| ConfigError::InvalidValue {
                var: "SWEEP_SCHEDULE".to_string(),
                message,
            })?;

        let pause_ms: u64 = env::var("SWEEP_PAUSE_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                var: "SWEEP_PAUSE_MS".to_string(),
                message: "Must be a non-negative integer".to_string(),
            })?;

        let sweep_on_startup = env::var("SWEEP_ON_STARTUP")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            rust_log,
            rama_base_url,
            schedule,
            pause_between_cases: Duration::from_millis(pause_ms),
            sweep_on_startup,
        })
    }
}
