use std::{env, fmt::Display, fs::File, path::Path, str::FromStr, sync::Mutex};

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Loads `.env` unless running in production.
pub fn load_dotenv() {
    if env::var("ENV").ok().as_deref() != Some("prod") {
        dotenvy::dotenv().ok();
    }
}

/// Reads `key` from the environment, falling back to `default` when unset.
pub fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("invalid {key} value {raw:?}: {e}"))
}

/// Reads a variable that has no sensible default.
pub fn require(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| {
        warn!("environment variable {key} not found");
        anyhow::anyhow!("{key} must be set")
    })
}

/// Terminal front ends log to a file so the screen stays clean.
pub fn init_file_tracing(path: impl AsRef<Path>) -> anyhow::Result<()> {
    let file = File::create(path.as_ref())?;
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Settings for the offline tracker.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_path: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            log_path: try_load("SHOE_LOG", "shoe-ledger.log")?,
        })
    }
}
