// Application configuration
// Uses the 'config' crate layered over defaults, config.toml and APP__* env vars

use anyhow::{Result, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::latency::Latency;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server_address: String,
    // Directory holding vehicles.json, dealerships.json and savedSearches.json
    pub data_dir: PathBuf,
    // File backing the client key-value store
    pub store_path: PathBuf,
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("data_dir", "data")?
            .set_default("store_path", "storage/client_store.json")?
            .set_default("latency_min_ms", 200_i64)?
            .set_default("latency_max_ms", 500_i64)?
            .add_source(File::with_name("config").required(false))
            // e.g. APP__SERVER_ADDRESS, APP__LATENCY_MAX_MS
            .add_source(Environment::with_prefix("APP").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.latency_min_ms > self.latency_max_ms {
            bail!(
                "latency_min_ms ({}) must not exceed latency_max_ms ({})",
                self.latency_min_ms,
                self.latency_max_ms
            );
        }
        Ok(())
    }

    pub fn latency(&self) -> Latency {
        Latency::new(self.latency_min_ms, self.latency_max_ms)
    }
}
