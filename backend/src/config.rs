use shoe_ledger::config::{require, try_load};

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub max_connections: u32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            port: try_load("PORT", "8080")?,
            database_url: require("DATABASE_URL")?,
            jwt_secret: require("JWT_SECRET")?,
            max_connections: try_load("DB_MAX_CONNECTIONS", "10")?,
        })
    }
}
