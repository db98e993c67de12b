use std::time::Duration;

use shoe_ledger::config::try_load;

pub struct Config {
    pub api_url: String,
    pub log_path: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            api_url: try_load("SHOE_API_URL", "http://127.0.0.1:8080")?,
            log_path: try_load("SHOE_LOG", "shoe-client.log")?,
            request_timeout: Duration::from_secs(try_load("SHOE_HTTP_TIMEOUT_SECS", "10")?),
        })
    }
}
